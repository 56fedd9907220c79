pub mod employee;

pub use employee::{DashboardLink, Department, EmployeeRecord, Period, RecipientRecord};
