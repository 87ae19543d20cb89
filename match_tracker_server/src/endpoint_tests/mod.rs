mod callbacks;
mod helpers;
mod mocks;
mod processing;
mod roster;
