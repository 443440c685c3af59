//! Size ceilings, configuration and form clearing.

mod common;

use std::io::Write;

use anyhow::Result;
use common::Identity;
use pgpdesk::{
    DecryptController, EncryptController, ErrorCategory, FlowState, GenerateController,
    InspectController, Settings, SignController, VerifyController,
};

#[tokio::test]
async fn test_message_at_limit_accepted_and_over_limit_rejected() -> Result<()> {
    let bob = Identity::generate("Bob", "bob@example.org").await?;
    let settings = Settings {
        max_input_bytes: 64 * 1024,
        ..Settings::default()
    };

    let mut controller = EncryptController::new(&settings);
    let id = controller.recipients().entries()[0].id;
    controller
        .recipients_mut()
        .update(id, bob.public_armored.clone())?;

    controller.set_message("a".repeat(64 * 1024));
    assert!(controller.encrypt().await.is_ok());

    controller.set_message("a".repeat(64 * 1024 + 1));
    let err = controller.encrypt().await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Size);
    assert_eq!(err.user_message(), "Input is too large. Maximum size is 64 KiB.");
    Ok(())
}

#[tokio::test]
async fn test_oversized_key_rejected_before_parsing() {
    let settings = Settings {
        max_input_bytes: 1024,
        ..Settings::default()
    };
    let mut controller = InspectController::new(&settings);
    controller.set_key(format!(
        "-----BEGIN PGP PUBLIC KEY BLOCK-----\n{}\n-----END PGP PUBLIC KEY BLOCK-----",
        "A".repeat(2048)
    ));

    let err = controller.inspect().await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Size);
}

#[tokio::test]
async fn test_settings_file_drives_passphrase_policy() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, r#"{{"minPassphraseLength": 20}}"#)?;
    let settings = Settings::from_file(file.path())?;

    let mut controller = GenerateController::new(&settings);
    controller.set_name("Gina");
    controller.set_email("gina@example.org");
    controller.set_passphrase("sixteen chars ok");
    controller.set_passphrase_confirmation("sixteen chars ok");

    let err = controller.generate().await.unwrap_err();
    assert_eq!(err.user_message(), "Passphrase must be at least 20 characters.");
    Ok(())
}

#[tokio::test]
async fn test_clear_returns_every_flow_to_idle() -> Result<()> {
    let alice = Identity::generate("Alice", "alice@example.org").await?;

    let mut encrypt = EncryptController::default();
    encrypt.set_message("draft");
    let _ = encrypt.encrypt().await;
    encrypt.clear();
    assert_eq!(encrypt.state(), FlowState::Idle);
    assert!(encrypt.result().is_none());
    assert!(encrypt.recipients().is_empty());

    let mut decrypt = DecryptController::default();
    decrypt.set_message("not armored");
    decrypt.set_private_key(alice.secret_armored.clone());
    decrypt.set_passphrase(alice.passphrase.clone());
    let _ = decrypt.decrypt().await;
    assert_eq!(decrypt.state(), FlowState::Error);
    decrypt.clear();
    assert_eq!(decrypt.state(), FlowState::Idle);
    assert!(!decrypt.has_passphrase());

    let mut sign = SignController::default();
    sign.set_message("x");
    sign.set_private_key(alice.secret_armored.clone());
    let _ = sign.sign().await;
    assert_eq!(sign.state(), FlowState::NeedsPassphrase);
    sign.clear();
    assert_eq!(sign.state(), FlowState::Idle);
    assert!(sign.result().is_none());

    let mut verify = VerifyController::default();
    let _ = verify.verify().await;
    verify.clear();
    assert_eq!(verify.state(), FlowState::Idle);

    let mut generate = GenerateController::default();
    let _ = generate.generate().await;
    generate.clear();
    assert_eq!(generate.state(), FlowState::Idle);
    Ok(())
}

#[test]
fn test_result_serializes_camel_case() -> Result<()> {
    let result = pgpdesk::OperationResult::<String>::failed(&pgpdesk::PgpError::Busy);
    let json = serde_json::to_value(&result)?;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "BUSY");
    assert!(json.get("data").is_none());
    Ok(())
}
