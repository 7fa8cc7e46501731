pub mod check_token;
