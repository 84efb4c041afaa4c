pub mod roles_seed;
