//! Daylight-hours provider for daylight-sensitive methods.
//!
//! Standard sunrise-equation approximation: solar declination from day of
//! year, hour angle from site latitude. Good to a few minutes, which is
//! ample for bounding a work day.

/// Hours of daylight at `lat_deg` on `day_of_year` (1-based).
///
/// Returns 0 for polar night and 24 for polar day.
pub fn daylight_hours(lat_deg: f64, day_of_year: u32) -> f64 {
    let decl = -23.44_f64.to_radians()
        * ((360.0 / 365.0) * (day_of_year as f64 + 10.0)).to_radians().cos();
    let lat = lat_deg.to_radians();
    let cos_hour_angle = -(lat.tan() * decl.tan());
    if cos_hour_angle <= -1.0 {
        24.0
    } else if cos_hour_angle >= 1.0 {
        0.0
    } else {
        2.0 * cos_hour_angle.acos().to_degrees() / 15.0
    }
}
