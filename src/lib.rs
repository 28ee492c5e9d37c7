//! est: project estimation and profitability toolkit
//!
//! Turns a loosely written project request into an effort estimate, a
//! sales price and a profitability analysis, driven by a YAML rate catalog.

pub mod catalog;
pub mod cli;
pub mod core;
pub mod engine;
pub mod yaml;
