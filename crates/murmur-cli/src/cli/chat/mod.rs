//! Interactive terminal chat with a remote agent.
//!
//! Streams replies incrementally, shows the agent's welcome panel and prompt
//! suggestions while the conversation phase allows it, renders resolved
//! cards after each reply, and handles slash commands.
//! Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
