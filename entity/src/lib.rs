pub mod session_entries;
