pub mod nightly;
