//! One-time signup codes

use rand::rngs::OsRng;
use rand::Rng;

pub const OTP_MIN: u32 = 1000;
pub const OTP_MAX: u32 = 9999;

/// A 4-digit code in `1000..=9999`, drawn from the OS CSPRNG.
pub fn generate_otp() -> String {
    OsRng.gen_range(OTP_MIN..=OTP_MAX).to_string()
}
