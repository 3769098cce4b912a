//! Great-circle distance and constant-speed travel-time fallbacks.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Travel time in seconds assuming a constant speed.
pub fn time_seconds(lat1: f64, lon1: f64, lat2: f64, lon2: f64, speed_kmh: f64) -> f64 {
    distance_km(lat1, lon1, lat2, lon2) / speed_kmh * 3600.0
}

/// `N×N` travel-time matrix in whole minutes, zero diagonal.
pub fn matrix_minutes(coords: &[(f64, f64)], speed_kmh: f64) -> Vec<Vec<u32>> {
    let n = coords.len();
    let mut matrix = vec![vec![0u32; n]; n];
    for i in 0..n {
        let (lat1, lon1) = coords[i];
        for j in 0..n {
            if i == j {
                continue;
            }
            let (lat2, lon2) = coords[j];
            let sec = time_seconds(lat1, lon1, lat2, lon2, speed_kmh);
            matrix[i][j] = (sec / 60.0).round().max(0.0) as u32;
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        assert_eq!(distance_km(1.3, 103.8, 1.3, 103.8), 0.0);
    }

    #[test]
    fn known_distance_singapore_to_kl() {
        // Marina Bay to Petronas Towers, roughly 310 km.
        let d = distance_km(1.2834, 103.8607, 3.1579, 101.7116);
        assert!((d - 310.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = distance_km(1.29, 103.85, 1.35, 103.99);
        let b = distance_km(1.35, 103.99, 1.29, 103.85);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn time_scales_inversely_with_speed() {
        let slow = time_seconds(1.29, 103.85, 1.35, 103.99, 15.0);
        let fast = time_seconds(1.29, 103.85, 1.35, 103.99, 30.0);
        assert!((slow - 2.0 * fast).abs() < 1e-6);
    }

    #[test]
    fn matrix_has_zero_diagonal_and_rounded_minutes() {
        let coords = [(1.29, 103.85), (1.35, 103.99), (1.31, 103.80)];
        let m = matrix_minutes(&coords, 25.0);
        for (i, row) in m.iter().enumerate() {
            assert_eq!(row[i], 0);
        }
        let expected = (time_seconds(1.29, 103.85, 1.35, 103.99, 25.0) / 60.0).round() as u32;
        assert_eq!(m[0][1], expected);
    }
}
