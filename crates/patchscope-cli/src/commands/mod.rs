pub mod list_patches;
pub mod list_updates;
pub mod patch;
pub mod patch_check;
