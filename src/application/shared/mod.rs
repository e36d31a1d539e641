pub mod uniqueness_guard;
