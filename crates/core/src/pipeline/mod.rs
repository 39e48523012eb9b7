pub mod cycle_timer;
pub mod detection_loop;
