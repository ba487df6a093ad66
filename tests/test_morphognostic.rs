use std::sync::Arc;

use morphognosis::config::{MorphognosticConfig, NeighborhoodConfig};
use morphognosis::{Morphognostic, Orientation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn multi_scale(binary: bool) -> Arc<MorphognosticConfig> {
    Arc::new(
        MorphognosticConfig::new(
            vec![1, 3],
            vec![
                NeighborhoodConfig::new(3, 1, 1),
                NeighborhoodConfig::new(9, 3, 4),
            ],
            binary,
        )
        .unwrap(),
    )
}

fn wander(m: &mut Morphognostic, rng: &mut StdRng, steps: usize) {
    for _ in 0..steps {
        let values = [rng.random_range(-1..5), rng.random_range(-1..3)];
        let x = rng.random_range(-4..5);
        let y = rng.random_range(-4..5);
        m.update(&values, x, y).unwrap();
    }
}

#[test]
fn test_compare_with_itself_is_zero() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut m = Morphognostic::new(Orientation::SouthWest, multi_scale(false)).unwrap();
    wander(&mut m, &mut rng, 25);
    assert_eq!(m.compare(&m).unwrap(), 0.0);
    assert_eq!(m.compare(&m.clone()).unwrap(), 0.0);
}

#[test]
fn test_compare_is_symmetric() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut a = Morphognostic::new(Orientation::East, multi_scale(false)).unwrap();
    let mut b = Morphognostic::new(Orientation::South, multi_scale(false)).unwrap();
    wander(&mut a, &mut rng, 30);
    wander(&mut b, &mut rng, 30);
    let ab = a.compare(&b).unwrap();
    assert!(ab > 0.0);
    assert_eq!(ab, b.compare(&a).unwrap());
}

#[test]
fn test_event_log_stays_bounded() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut m = Morphognostic::new(Orientation::North, multi_scale(false)).unwrap();
    for _ in 0..40 {
        wander(&mut m, &mut rng, 1);
        assert!(m.events().len() <= 4);
        let now = m.event_time() - 1;
        assert!(m.events().iter().all(|e| e.age(now) <= m.events().max_age()));
    }
}

#[test]
fn test_densities_nonnegative() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut m = Morphognostic::new(Orientation::North, multi_scale(false)).unwrap();
    wander(&mut m, &mut rng, 50);
    assert!(m.rectified_densities().iter().all(|&d| d >= 0.0));
}

#[test]
fn test_binary_densities_are_presence() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut m = Morphognostic::new(Orientation::North, multi_scale(true)).unwrap();
    wander(&mut m, &mut rng, 50);
    assert!(m
        .rectified_densities()
        .iter()
        .all(|&d| d == 0.0 || d == 1.0));
}

#[test]
fn test_single_event_lands_in_center() {
    let config = Arc::new(
        MorphognosticConfig::new(vec![1], vec![NeighborhoodConfig::new(3, 1, 1)], false).unwrap(),
    );
    let mut m = Morphognostic::new(Orientation::North, Arc::clone(&config)).unwrap();
    m.update(&[1], 0, 0).unwrap();

    let n = &m.neighborhoods()[0];
    assert_eq!(n.sector(1, 1).density(0, 0), 1.0);
    assert_eq!(m.rectified_densities().iter().sum::<f32>(), 1.0);

    let original = m.clone();
    let fresh = Morphognostic::new(Orientation::North, config).unwrap();
    assert_eq!(m.compare(&fresh).unwrap(), 1.0);
    m.clear();
    assert_eq!(m.compare(&fresh).unwrap(), 0.0);
    assert_eq!(m.event_time(), 1);

    // Replaying the same sequence after a clear reproduces the descriptor.
    m.update(&[1], 0, 0).unwrap();
    assert_eq!(m.compare(&original).unwrap(), 0.0);
    assert_eq!(m.event_time(), 2);
    assert_eq!(m.events().last().unwrap().time, 1);
}

#[test]
fn test_rotated_views_match() {
    let config = Arc::new(
        MorphognosticConfig::new(vec![1], vec![NeighborhoodConfig::new(3, 1, 2)], false).unwrap(),
    );
    // The same past event seen one step ahead, from two headings.
    let mut north = Morphognostic::new(Orientation::North, Arc::clone(&config)).unwrap();
    north.update(&[1], 1, 0).unwrap();
    north.update(&[0], 0, 0).unwrap();

    let mut east = Morphognostic::new(Orientation::East, Arc::clone(&config)).unwrap();
    east.update(&[1], 0, 1).unwrap();
    east.update(&[0], 0, 0).unwrap();

    assert_eq!(north.neighborhoods()[0].sector(2, 1).density(0, 0), 0.5);
    assert_eq!(east.neighborhoods()[0].sector(1, 2).density(0, 0), 0.5);
    assert_eq!(north.compare(&east).unwrap(), 0.0);

    east.orientation = Orientation::North;
    assert_eq!(north.compare(&east).unwrap(), 1.0);
}

#[test]
fn test_unknown_values_are_ignored() {
    let mut m = Morphognostic::new(Orientation::North, multi_scale(false)).unwrap();
    m.update(&[-1, -1], 0, 0).unwrap();
    assert!(m.rectified_densities().iter().all(|&d| d == 0.0));
    assert_eq!(m.events().len(), 1);
}
