//! Branch names, references and the current position
//!
//! - `branch_name`: validated branch names
//! - `reference`: user tokens resolved to a branch, a digest or the current position
//! - `head_state`: attached/detached state of HEAD

pub mod branch_name;
pub mod head_state;
pub mod reference;

pub const INVALID_BRANCH_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";
/// Token naming the current position
pub const HEAD_REF_NAME: &str = "HEAD";
pub const DEFAULT_BRANCH: &str = "main";
pub const REF_ALIASES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "@" => "HEAD",
};
