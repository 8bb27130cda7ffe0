//! Route completion policy

/// Default minimum route length before a looping agent asks for more
pub const DEFAULT_MIN_WAYPOINTS: usize = 21;

/// What the adapter should do with the route this iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Continue,
    /// Extend the route towards a new destination
    Reroute,
    /// Route exhausted and not looping: stop after this iteration
    Finish,
}

/// Decides when to reroute or finish based on the remaining route length
///
/// A reroute fires once per transition below the minimum: if the route
/// length does not change on the following frames, no further reroute is
/// requested until the length changes.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    min_waypoints: usize,
    loop_route: bool,
    last_rerouted_len: Option<usize>,
}

impl RoutePolicy {
    pub fn new(min_waypoints: usize, loop_route: bool) -> Self {
        Self {
            min_waypoints,
            loop_route,
            last_rerouted_len: None,
        }
    }

    pub fn min_waypoints(&self) -> usize {
        self.min_waypoints
    }

    pub fn is_looping(&self) -> bool {
        self.loop_route
    }

    /// `remaining` is `None` for agents without a route
    pub fn decide(&mut self, remaining: Option<usize>) -> RouteDecision {
        let Some(len) = remaining else {
            return RouteDecision::Continue;
        };

        if self.loop_route && len < self.min_waypoints {
            if self.last_rerouted_len == Some(len) {
                return RouteDecision::Continue;
            }
            self.last_rerouted_len = Some(len);
            return RouteDecision::Reroute;
        }
        self.last_rerouted_len = None;

        if len == 0 && !self.loop_route {
            return RouteDecision::Finish;
        }
        RouteDecision::Continue
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_WAYPOINTS, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_reroute_on_transition() {
        let mut policy = RoutePolicy::new(21, true);
        assert_eq!(policy.decide(Some(22)), RouteDecision::Continue);
        assert_eq!(policy.decide(Some(20)), RouteDecision::Reroute);
        assert_eq!(policy.decide(Some(20)), RouteDecision::Continue);
        assert_eq!(policy.decide(Some(20)), RouteDecision::Continue);
    }

    #[test]
    fn test_reroute_again_when_length_moves() {
        let mut policy = RoutePolicy::new(21, true);
        assert_eq!(policy.decide(Some(20)), RouteDecision::Reroute);
        // the new route did not reach far enough yet
        assert_eq!(policy.decide(Some(19)), RouteDecision::Reroute);
        assert_eq!(policy.decide(Some(60)), RouteDecision::Continue);
        assert_eq!(policy.decide(Some(19)), RouteDecision::Reroute);
    }

    #[test]
    fn test_finish_without_loop() {
        let mut policy = RoutePolicy::new(21, false);
        assert_eq!(policy.decide(Some(5)), RouteDecision::Continue);
        assert_eq!(policy.decide(Some(0)), RouteDecision::Finish);
    }

    #[test]
    fn test_looping_never_finishes() {
        let mut policy = RoutePolicy::new(21, true);
        assert_eq!(policy.decide(Some(0)), RouteDecision::Reroute);
        assert_eq!(policy.decide(Some(0)), RouteDecision::Continue);
    }

    #[test]
    fn test_no_route() {
        let mut policy = RoutePolicy::default();
        assert_eq!(policy.decide(None), RouteDecision::Continue);
        assert_eq!(policy.min_waypoints(), DEFAULT_MIN_WAYPOINTS);
    }
}
