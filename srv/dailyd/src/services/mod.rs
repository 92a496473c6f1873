pub mod dictionary;
pub mod generator;
pub mod leaderboard;
pub mod providers;
pub mod resolver;
pub mod scoring;
pub mod word_loader;
