pub mod frame_diff_detector;
