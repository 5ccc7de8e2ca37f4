extern crate otpauth;
use std::env;

fn main() {
    let args = env::args().collect::<Vec<_>>();
    let credential = match args.len() {
        2 => otpauth::parse_uri(&args[1]),
        3 => otpauth::new_credential(&args[1], &args[2]),
        _ => {
            println!("Usage: ./make_totp <otpauth-uri> | ./make_totp <issuer> <account>");
            return;
        }
    };
    match credential.and_then(|c| c.formatted_code_at(otpauth::hotp::now()).map(|code| (c, code))) {
        Ok((c, code)) => println!("{}\n{}", c.uri(), code),
        Err(e) => println!("error: {}", e),
    }
}
