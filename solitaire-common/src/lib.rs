pub mod action;
pub mod board;
pub mod card;
