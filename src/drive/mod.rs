mod driver;
mod step;

pub use {
    driver::{fail_after_iters, fixed_iters, BoxedDriver, Decision, Drive, Driver},
    step::{Step, Stop},
};
