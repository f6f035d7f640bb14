pub mod publish_yield;
