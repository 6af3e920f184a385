pub mod cli;
pub mod config;
pub mod controller;
pub mod data;
pub mod editor;
pub mod server;
pub mod solver;
