//! Image decode
//!
//! Turns raw camera buffers and lidar sweeps into `Surface`, a fixed-layout
//! row-major RGB8 pixel buffer the render loop can blit as is.

use bytemuck::{Pod, Zeroable};
use bytes::Bytes;
use contracts::{ColorConverter, ImageData, ImageFormat, PointCloudData, RecordedFrame};

use crate::error::{Result, SensorError};

/// Decoded, display-ready pixels
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB8
    pub rgb: Bytes,
}

impl Surface {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]])
    }

    pub fn to_recorded_frame(&self, frame: u64) -> RecordedFrame {
        RecordedFrame {
            frame,
            width: self.width,
            height: self.height,
            rgb: self.rgb.clone(),
        }
    }
}

/// One lidar return as laid out in the sweep buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LidarPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
}

const POINT_SIZE: usize = std::mem::size_of::<LidarPoint>();

/// Bird's-eye view of a lidar sweep
///
/// Keeps (x, y), scales by `min(w, h) / 100`, shifts by half the display,
/// takes absolute values and truncates. Points landing outside the image are
/// dropped.
pub fn decode_point_cloud(cloud: &PointCloudData, width: u32, height: u32) -> Result<Surface> {
    if cloud.point_stride as usize != POINT_SIZE {
        return Err(SensorError::decode(
            "point cloud",
            format!("unsupported point stride {}", cloud.point_stride),
        ));
    }
    if cloud.data.len() % POINT_SIZE != 0 {
        return Err(SensorError::decode(
            "point cloud",
            format!("buffer length {} is not a whole number of points", cloud.data.len()),
        ));
    }

    let (w, h) = (width as usize, height as usize);
    let mut rgb = vec![0u8; w * h * 3];
    let scale = width.min(height) as f32 / 100.0;
    let (half_w, half_h) = (0.5 * width as f32, 0.5 * height as f32);

    for chunk in cloud.data.chunks_exact(POINT_SIZE) {
        let point: LidarPoint = bytemuck::pod_read_unaligned(chunk);
        let px = (point.x * scale + half_w).abs() as usize;
        let py = (point.y * scale + half_h).abs() as usize;
        if px >= w || py >= h {
            continue;
        }
        let i = (py * w + px) * 3;
        rgb[i..i + 3].copy_from_slice(&[255, 255, 255]);
    }

    Ok(Surface {
        width,
        height,
        rgb: Bytes::from(rgb),
    })
}

/// Decode a camera image, applying `converter` before dropping alpha
pub fn decode_raster(image: &ImageData, converter: ColorConverter) -> Result<Surface> {
    let bpp = image.format.bytes_per_pixel();
    let expected = image.width as usize * image.height as usize * bpp;
    if image.data.len() != expected {
        return Err(SensorError::decode(
            "image",
            format!(
                "expected {expected} bytes for {}x{} {:?}, got {}",
                image.width,
                image.height,
                image.format,
                image.data.len()
            ),
        ));
    }

    let pixels = image.width as usize * image.height as usize;
    let mut rgb = Vec::with_capacity(pixels * 3);
    for px in image.data.chunks_exact(bpp) {
        let [r, g, b] = match image.format {
            ImageFormat::Bgra8 => [px[2], px[1], px[0]],
            ImageFormat::Rgba8 | ImageFormat::Rgb8 => [px[0], px[1], px[2]],
        };
        rgb.extend_from_slice(&convert_color([r, g, b], converter));
    }

    Ok(Surface {
        width: image.width,
        height: image.height,
        rgb: Bytes::from(rgb),
    })
}

/// Apply a colour conversion to one RGB pixel
pub fn convert_color(rgb: [u8; 3], converter: ColorConverter) -> [u8; 3] {
    match converter {
        ColorConverter::Raw => rgb,
        ColorConverter::Depth => gray((normalized_depth(rgb) * 255.0) as u8),
        ColorConverter::LogarithmicDepth => {
            gray((logarithmic_depth(normalized_depth(rgb)) * 255.0) as u8)
        }
        ColorConverter::CityScapesPalette => cityscapes_color(rgb[0]),
    }
}

fn gray(v: u8) -> [u8; 3] {
    [v, v, v]
}

/// Depth encoded over 24 bits, `(R + G*256 + B*256²) / (256³ - 1)`
pub fn normalized_depth([r, g, b]: [u8; 3]) -> f32 {
    let encoded = r as f32 + g as f32 * 256.0 + b as f32 * 65536.0;
    encoded / 16_777_215.0
}

fn logarithmic_depth(depth: f32) -> f32 {
    const LN_1000M: f32 = 5.70378;
    (1.0 + depth.ln() / LN_1000M).clamp(0.005, 1.0)
}

/// Semantic tag (stored in the red channel) to CityScapes colour
pub fn cityscapes_color(tag: u8) -> [u8; 3] {
    const PALETTE: [[u8; 3]; 23] = [
        [0, 0, 0],       // unlabeled
        [70, 70, 70],    // building
        [100, 40, 40],   // fence
        [55, 90, 80],    // other
        [220, 20, 60],   // pedestrian
        [153, 153, 153], // pole
        [157, 234, 50],  // road line
        [128, 64, 128],  // road
        [244, 35, 232],  // sidewalk
        [107, 142, 35],  // vegetation
        [0, 0, 142],     // vehicle
        [102, 102, 156], // wall
        [220, 220, 0],   // traffic sign
        [70, 130, 180],  // sky
        [81, 0, 81],     // ground
        [150, 100, 100], // bridge
        [230, 150, 140], // rail track
        [180, 165, 180], // guard rail
        [250, 170, 30],  // traffic light
        [110, 190, 160], // static
        [170, 120, 50],  // dynamic
        [45, 60, 150],   // water
        [145, 170, 100], // terrain
    ];
    PALETTE.get(tag as usize).copied().unwrap_or([0, 0, 0])
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    fn cloud(points: &[[f32; 4]]) -> PointCloudData {
        let mut data = Vec::with_capacity(points.len() * POINT_SIZE);
        for p in points {
            let point = LidarPoint {
                x: p[0],
                y: p[1],
                z: p[2],
                intensity: p[3],
            };
            data.extend_from_slice(bytemuck::bytes_of(&point));
        }
        PointCloudData {
            num_points: points.len() as u32,
            point_stride: POINT_SIZE as u32,
            data: Bytes::from(data),
        }
    }

    #[test]
    fn test_point_cloud_projection() {
        // 200x100 display: scale 1.0, centre (100, 50)
        let surface = decode_point_cloud(&cloud(&[[10.0, -20.0, 1.0, 0.5]]), 200, 100).unwrap();
        assert_eq!(surface.pixel(110, 30), Some([255, 255, 255]));
        assert_eq!(surface.pixel(100, 50), Some([0, 0, 0]));
    }

    #[test]
    fn test_point_cloud_abs_and_truncate() {
        // x = -150 * 1.0 + 100 = -50 -> 50; y = 0.9 + 50 -> 50
        let surface = decode_point_cloud(&cloud(&[[-150.0, 0.9, 0.0, 0.0]]), 200, 100).unwrap();
        assert_eq!(surface.pixel(50, 50), Some([255, 255, 255]));
    }

    #[test]
    fn test_point_cloud_drops_out_of_range() {
        let surface =
            decode_point_cloud(&cloud(&[[500.0, 0.0, 0.0, 0.0], [0.0, 80.0, 0.0, 0.0]]), 200, 100)
                .unwrap();
        assert!(surface.rgb.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_random_sweep_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let points: Vec<[f32; 4]> = (0..1000)
            .map(|_| {
                [
                    rng.random_range(-300.0..300.0),
                    rng.random_range(-300.0..300.0),
                    0.0,
                    1.0,
                ]
            })
            .collect();
        let surface = decode_point_cloud(&cloud(&points), 320, 240).unwrap();
        assert_eq!(surface.rgb.len(), 320 * 240 * 3);
    }

    #[test]
    fn test_point_cloud_rejects_bad_stride() {
        let mut bad = cloud(&[[0.0; 4]]);
        bad.point_stride = 12;
        assert!(decode_point_cloud(&bad, 10, 10).is_err());
    }

    #[test]
    fn test_raster_bgra_to_rgb() {
        let image = ImageData {
            width: 2,
            height: 1,
            format: ImageFormat::Bgra8,
            data: Bytes::from_static(&[1, 2, 3, 255, 10, 20, 30, 255]),
        };
        let surface = decode_raster(&image, ColorConverter::Raw).unwrap();
        assert_eq!(surface.rgb.as_ref(), &[3, 2, 1, 30, 20, 10]);
    }

    #[test]
    fn test_raster_size_mismatch() {
        let image = ImageData {
            width: 2,
            height: 2,
            format: ImageFormat::Bgra8,
            data: Bytes::from_static(&[0; 8]),
        };
        assert!(decode_raster(&image, ColorConverter::Raw).is_err());
    }

    #[test]
    fn test_depth_conversion() {
        assert_eq!(convert_color([0, 0, 0], ColorConverter::Depth), [0, 0, 0]);
        assert_eq!(
            convert_color([255, 255, 255], ColorConverter::Depth),
            [255, 255, 255]
        );
        // 1000 m encodes to 1.0, anything close to the camera is near black
        assert_eq!(
            convert_color([0, 0, 0], ColorConverter::LogarithmicDepth),
            [1, 1, 1]
        );
        assert_eq!(
            convert_color([255, 255, 255], ColorConverter::LogarithmicDepth),
            [255, 255, 255]
        );
    }

    #[test]
    fn test_cityscapes_palette() {
        assert_eq!(
            convert_color([7, 0, 0], ColorConverter::CityScapesPalette),
            [128, 64, 128]
        );
        assert_eq!(cityscapes_color(13), [70, 130, 180]);
        assert_eq!(cityscapes_color(200), [0, 0, 0]);
    }
}
