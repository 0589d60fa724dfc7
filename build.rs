#[cfg(all(
    feature = "http",
    not(any(feature = "rustls-marker", feature = "native-marker"))
))]
compile_error!(
    "You have the `http` feature enabled: \
    either the `rustls` or `native` feature must be
    selected to let the network fetcher speak HTTPS.\n\
    - `rustls` uses Rustls, a pure Rust TLS-implemenation.\n\
    - `native` uses SChannel on Windows, Secure Transport on macOS, \
    and OpenSSL on other platforms.\n\
    If you are unsure, go with `rustls`."
);

fn main() {}
