pub mod agenda;
pub mod calendar;
pub mod config;
pub mod error;
pub mod legacy;
pub mod model;
pub mod notify;
pub mod planner_api;
pub mod reminder;
pub mod storage;
