//! orgnet: team communication analytics (Energy, Engagement, Exploration and
//! network structure) with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
