#[cfg(test)]
mod stringify_tests;
