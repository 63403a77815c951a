//! Coordinate to Maidenhead grid locator conversion
//!
//! Maps a geographic point to the 6-character locator used on contact
//! records: an alphabetic field pair (20°×10° cells, A-R), a numeric square
//! pair (2°×1°, 0-9) and an alphabetic subsquare pair (5′×2.5′, A-X).

/// Convert a coordinate to a 6-character Maidenhead grid locator
///
/// Total over valid coordinates (`latitude ∈ [-90, 90]`,
/// `longitude ∈ [-180, 180]`); longitudes past 180 wrap around.
/// Points exactly on the north pole or the antimeridian sit on the outer
/// cell boundary and are clamped into the last field.
///
/// # Examples
///
/// ```rust
/// use qsoplan_client::grid::grid_square;
///
/// assert_eq!(grid_square(51.505, -0.09), "IO91WM");
/// ```
pub fn grid_square(latitude: f64, longitude: f64) -> String {
    // Wrap longitudes past the antimeridian back into (-180, 180].
    let longitude = if longitude > 180.0 {
        longitude - 360.0
    } else {
        longitude
    };

    let adj_lon = longitude + 180.0;
    let adj_lat = latitude + 90.0;

    let field_lon = ((adj_lon / 20.0).floor() as i32).clamp(0, 17);
    let field_lat = ((adj_lat / 10.0).floor() as i32).clamp(0, 17);

    let square_lon = ((adj_lon % 20.0) / 2.0).floor() as u8;
    let square_lat = (adj_lat % 10.0).floor() as u8;

    let sub_lon = (((adj_lon % 2.0) * 12.0).floor() as i32).clamp(0, 23);
    let sub_lat = (((adj_lat % 1.0) * 24.0).floor() as i32).clamp(0, 23);

    let locator = format!(
        "{}{}{}{}{}{}",
        (b'A' + field_lon as u8) as char,
        (b'A' + field_lat as u8) as char,
        square_lon,
        square_lat,
        (b'a' + sub_lon as u8) as char,
        (b'a' + sub_lat as u8) as char,
    );

    locator.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_locators() {
        // Central London, the service's default map centre.
        assert_eq!(grid_square(51.505, -0.09), "IO91WM");
        // Origin of the grid.
        assert_eq!(grid_square(-90.0, -180.0), "AA00AA");
        // Null Island sits on the AA corner of field JJ.
        assert_eq!(grid_square(0.0, 0.0), "JJ00AA");
    }

    #[test]
    fn test_always_six_uppercase_alphanumeric() {
        let mut lat = -90.0;
        while lat < 90.0 {
            let mut lon = -179.5;
            while lon <= 180.0 {
                let locator = grid_square(lat, lon);
                assert_eq!(locator.len(), 6, "{} for ({}, {})", locator, lat, lon);
                assert!(
                    locator.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
                    "{} for ({}, {})",
                    locator,
                    lat,
                    lon
                );
                lon += 7.3;
            }
            lat += 4.7;
        }
    }

    #[test]
    fn test_stable_within_subsquare() {
        // A subsquare spans 5 minutes of longitude and 2.5 minutes of
        // latitude; two nearby points inside one must agree.
        let a = grid_square(51.5050, -0.0900);
        let b = grid_square(51.5055, -0.0895);
        assert_eq!(a, b);
    }

    #[test]
    fn test_adjacent_subsquares_differ() {
        let a = grid_square(51.505, -0.09);
        let b = grid_square(51.505, -0.09 + 5.0 / 60.0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_longitude_wrap() {
        // 200°E is the same meridian as 160°W.
        assert_eq!(grid_square(10.0, 200.0), grid_square(10.0, -160.0));
    }

    #[test]
    fn test_boundary_clamped() {
        let locator = grid_square(90.0, 180.0);
        assert_eq!(locator.len(), 6);
        assert!(locator.starts_with("RR"));
        assert!(locator.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
