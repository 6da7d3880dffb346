//! Command parameter bounds and wire markers.
//!
//! All bounds are inclusive.

/// Lowest addressable servo index.
pub const MIN_SERVO_ID: i64 = 0;

/// Highest addressable servo index.
pub const MAX_SERVO_ID: i64 = 6;

/// Number of servos on the controller.
pub const SERVO_COUNT: u8 = 7;

/// Lowest accepted target angle, in degrees.
pub const MIN_ANGLE: f64 = 0.0;

/// Highest accepted target angle, in degrees.
pub const MAX_ANGLE: f64 = 180.0;

/// Line terminator for requests and responses.
pub const TERMINATOR: u8 = b'\n';

/// Leading byte of every servo command.
pub const COMMAND_PREFIX: char = 'S';

/// Substrings a controller uses to report a rejected command.
pub const REJECTION_MARKERS: &[&str] = &["ERROR", "Invalid"];

/// Returns true if `servo_id` addresses a servo on the controller.
pub fn is_valid_servo_id(servo_id: i64) -> bool {
    (MIN_SERVO_ID..=MAX_SERVO_ID).contains(&servo_id)
}

/// Returns true if `angle` is a finite value inside the accepted range.
pub fn is_valid_angle(angle: f64) -> bool {
    angle.is_finite() && (MIN_ANGLE..=MAX_ANGLE).contains(&angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn servo_bounds_are_inclusive() {
        assert!(is_valid_servo_id(0));
        assert!(is_valid_servo_id(6));
        assert!(!is_valid_servo_id(-1));
        assert!(!is_valid_servo_id(7));
    }

    #[test]
    fn angle_bounds_are_inclusive() {
        assert!(is_valid_angle(0.0));
        assert!(is_valid_angle(180.0));
        assert!(is_valid_angle(120.25));
        assert!(!is_valid_angle(-1.0));
        assert!(!is_valid_angle(180.0001));
        assert!(!is_valid_angle(f64::NAN));
        assert!(!is_valid_angle(f64::INFINITY));
    }
}
