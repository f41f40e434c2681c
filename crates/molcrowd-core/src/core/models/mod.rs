pub mod occupant;
