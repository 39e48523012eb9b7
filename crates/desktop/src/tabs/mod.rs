pub mod faces_tab;
pub mod motion_tab;
