//! Task board server library
//!
//! A kanban-style task board: user-scoped tasks with status columns,
//! priorities, due dates, tracked time and sub-tasks, a server-persisted
//! board order, and a typed RPC surface over SQLite.

pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod rpc;
pub mod types;
pub mod web;
