pub mod calibration;
pub mod stuck_check;
