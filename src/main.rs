//! Entry point for the toon-condense binary.
//!
//! Delegates to [`toon_condense::run()`] and translates its `Result` into
//! process exit codes: `0` on success, `1` on any error.

fn main() {
    if toon_condense::run().is_err() {
        std::process::exit(1);
    }
}
