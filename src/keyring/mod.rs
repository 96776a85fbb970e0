pub mod key_holder;
pub mod keypair;
pub mod secp256k1;
