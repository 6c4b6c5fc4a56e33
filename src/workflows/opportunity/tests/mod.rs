mod common;

mod assessment;
mod repository;
