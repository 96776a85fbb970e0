use serde_json::json;

use crate::{
    did::did_resolver::StaticDidResolver,
    keyring::keypair::K256KeyPair,
    verifiable_credentials::{
        canonical::canonicalize,
        credential_signer::{PROOF_PURPOSE, PROOF_TYPE},
        types::{
            CredentialSubject, Degree, Proof, VerifiableCredential, CREDENTIALS_EXAMPLES_V1_CONTEXT,
            CREDENTIALS_V1_CONTEXT, UNIVERSITY_DEGREE_CREDENTIAL_TYPE, VERIFIABLE_CREDENTIAL_TYPE,
        },
    },
};

pub const UNI_DID: &str = "did:example:uniA";
pub const ALICE_DID: &str = "did:example:alice";

const UNI_SECRET_KEY: &str = "0xc739805ab03da62ddbe03390acdf7615640aa6ed31b8f18243f04a572c528edb";
const ALICE_SECRET_KEY: &str = "0x8da4ef21b864d2cc526dbdb2a120bd2874c36c9d0a1fb7f8c63d7f7a8b41de8f";

pub fn uni_keypair() -> K256KeyPair {
    K256KeyPair::from_hex(UNI_SECRET_KEY).unwrap()
}

pub fn alice_keypair() -> K256KeyPair {
    K256KeyPair::from_hex(ALICE_SECRET_KEY).unwrap()
}

pub fn scenario_resolver() -> StaticDidResolver {
    StaticDidResolver::default()
        .bind(UNI_DID, uni_keypair().address())
        .bind(ALICE_DID, alice_keypair().address())
}

pub fn unsigned_degree_credential_fixture() -> VerifiableCredential {
    let subject = CredentialSubject::new(ALICE_DID, Degree::new("BSc", "Computer Science", "AI"))
        .with_extension("university", json!("University of Technology"))
        .unwrap();

    VerifiableCredential {
        context: vec![
            CREDENTIALS_V1_CONTEXT.to_string(),
            CREDENTIALS_EXAMPLES_V1_CONTEXT.to_string(),
        ],
        id: "urn:uuid:3978344f-8596-4c3a-a978-8fcaba3903c5".to_string(),
        r#type: vec![
            VERIFIABLE_CREDENTIAL_TYPE.to_string(),
            UNIVERSITY_DEGREE_CREDENTIAL_TYPE.to_string(),
        ],
        issuer: UNI_DID.to_string(),
        issuance_date: "2024-06-01T12:00:00.000Z".to_string(),
        credential_subject: subject,
        evidence: vec![],
        proof: None,
    }
}

pub fn signed_degree_credential_fixture() -> VerifiableCredential {
    let model = unsigned_degree_credential_fixture();
    let canonical = canonicalize(&model).unwrap();
    let signature = uni_keypair().personal_sign(canonical.as_bytes()).unwrap();

    VerifiableCredential {
        proof: Some(Proof {
            r#type: PROOF_TYPE.to_string(),
            created: "2024-06-01T12:00:00.000Z".to_string(),
            proof_purpose: PROOF_PURPOSE.to_string(),
            verification_method: format!("{}#keys-1", UNI_DID),
            signature: signature.to_string(),
        }),
        ..model
    }
}
