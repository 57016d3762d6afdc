#[cfg(test)]
mod config;
#[cfg(test)]
mod handlers;
