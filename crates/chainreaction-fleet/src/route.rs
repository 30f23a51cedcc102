//! Route geometry.
//!
//! A route is `steps + 1` waypoints linearly interpolated from origin to
//! destination, each nudged by a small random offset so that trucks on
//! neighbouring corridors do not draw perfectly straight lines. The result
//! depends only on the inputs and the state of the supplied RNG.

use chainreaction_types::Coordinate;
use rand::Rng;

/// Default number of interpolation steps (yields 21 waypoints).
pub const DEFAULT_ROUTE_STEPS: u32 = 20;

/// Default maximum jitter applied to each coordinate, in degrees.
pub const DEFAULT_ROUTE_JITTER: f64 = 0.01;

/// Generate an interpolated route from `start` to `end`.
///
/// Returns `steps + 1` waypoints. With `steps == 0` the route is the single
/// (jittered) start point. Each coordinate receives an independent offset
/// drawn uniformly from `[-jitter, jitter]`; a non-positive or non-finite
/// jitter disables the offset.
pub fn generate_route(
    start: Coordinate,
    end: Coordinate,
    steps: u32,
    jitter: f64,
    rng: &mut impl Rng,
) -> Vec<Coordinate> {
    let apply_jitter = jitter.is_finite() && jitter > 0.0;

    (0..=steps)
        .map(|i| {
            let t = if steps == 0 {
                0.0
            } else {
                f64::from(i) / f64::from(steps)
            };
            let mut lon = (end.lon() - start.lon()).mul_add(t, start.lon());
            let mut lat = (end.lat() - start.lat()).mul_add(t, start.lat());
            if apply_jitter {
                lon += rng.random_range(-jitter..=jitter);
                lat += rng.random_range(-jitter..=jitter);
            }
            Coordinate::new(lon, lat)
        })
        .collect()
}
