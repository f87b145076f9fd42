pub mod agent;

#[cfg(test)]
mod polling {
    mod integration;
}
