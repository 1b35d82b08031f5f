//! Temporary password generation.

/// Characters a temporary password is drawn from.
pub const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&";

pub const PASSWORD_LENGTH: usize = 12;

/// Bytes at or above this value are discarded so every alphabet entry is
/// equally likely (largest multiple of the alphabet size below 256).
const ACCEPT_BELOW: u8 = (256 / PASSWORD_ALPHABET.len() * PASSWORD_ALPHABET.len()) as u8;

/// Generate a temporary password from the operating system CSPRNG.
pub fn generate_temporary_password() -> Result<String, getrandom::Error> {
    let mut password = String::with_capacity(PASSWORD_LENGTH);
    let mut bytes = [0u8; 32];

    while password.len() < PASSWORD_LENGTH {
        getrandom::fill(&mut bytes)?;
        for byte in bytes.iter().copied().filter(|b| *b < ACCEPT_BELOW) {
            if password.len() == PASSWORD_LENGTH {
                break;
            }
            let index = usize::from(byte) % PASSWORD_ALPHABET.len();
            password.push(char::from(PASSWORD_ALPHABET[index]));
        }
    }

    Ok(password)
}
