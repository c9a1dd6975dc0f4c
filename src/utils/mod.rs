pub mod profile_cache;
