//! End-to-end tests driving the controllers the way a front end would.

mod common;

use anyhow::Result;
use common::{init_test_logging, Identity};
use pgpdesk::types::SignMode;
use pgpdesk::{
    DecryptController, EncryptController, FlowState, InspectController, SignController,
    VerifyController,
};

async fn encrypt_to(recipients: &[&Identity], message: &str) -> Result<String> {
    let mut controller = EncryptController::default();
    for (index, identity) in recipients.iter().enumerate() {
        let id = match index {
            0 => controller.recipients().entries()[0].id,
            _ => controller.recipients_mut().add(),
        };
        controller
            .recipients_mut()
            .update(id, identity.public_armored.clone())?;
    }
    controller.set_message(message);
    Ok(controller.encrypt().await?.armored)
}

async fn decrypt_as(identity: &Identity, armored: &str) -> Result<String> {
    let mut controller = DecryptController::default();
    controller.set_message(armored);
    controller.set_private_key(identity.secret_armored.clone());
    controller.set_passphrase(identity.passphrase.clone());
    Ok(controller.decrypt().await?.text.as_str().to_owned())
}

#[tokio::test]
async fn test_encrypt_decrypt_round_trip() -> Result<()> {
    init_test_logging();
    let bob = Identity::generate("Bob", "bob@example.org").await?;

    let message = "Dinner at eight?\nBring the documents.";
    let armored = encrypt_to(&[&bob], message).await?;
    assert!(armored.starts_with("-----BEGIN PGP MESSAGE-----"));
    assert!(!armored.contains("Dinner"));

    assert_eq!(decrypt_as(&bob, &armored).await?, message);
    Ok(())
}

#[tokio::test]
async fn test_every_recipient_can_decrypt() -> Result<()> {
    let bob = Identity::generate("Bob", "bob@example.org").await?;
    let carol = Identity::generate("Carol", "carol@example.org").await?;

    let armored = encrypt_to(&[&bob, &carol], "for both of you").await?;

    assert_eq!(decrypt_as(&bob, &armored).await?, "for both of you");
    assert_eq!(decrypt_as(&carol, &armored).await?, "for both of you");
    Ok(())
}

#[tokio::test]
async fn test_outsider_cannot_decrypt() -> Result<()> {
    let bob = Identity::generate("Bob", "bob@example.org").await?;
    let eve = Identity::generate("Eve", "eve@example.org").await?;

    let armored = encrypt_to(&[&bob], "not for eve").await?;

    let mut controller = DecryptController::default();
    controller.set_message(armored);
    controller.set_private_key(eve.secret_armored.clone());
    controller.set_passphrase(eve.passphrase.clone());

    let err = controller.decrypt().await.unwrap_err();
    assert_eq!(err.code(), "CRYPTO_ERROR");
    assert_eq!(controller.state(), FlowState::Error);
    Ok(())
}

#[tokio::test]
async fn test_unicode_survives_round_trip() -> Result<()> {
    let bob = Identity::generate("Bob", "bob@example.org").await?;
    let message = "Grüße aus Köln \u{1F510}";

    let armored = encrypt_to(&[&bob], message).await?;
    assert_eq!(decrypt_as(&bob, &armored).await?, message);
    Ok(())
}

#[tokio::test]
async fn test_cleartext_sign_and_verify() -> Result<()> {
    init_test_logging();
    let alice = Identity::generate("Alice", "alice@example.org").await?;

    let mut signer = SignController::default();
    signer.set_message("The release is approved.");
    signer.set_private_key(alice.secret_armored.clone());
    signer.set_passphrase(alice.passphrase.clone());
    let signed = signer.sign().await?;
    assert_eq!(signed.signer_fingerprint, alice.fingerprint);

    let mut verifier = VerifyController::default();
    verifier.set_public_key(alice.public_armored.clone());
    verifier.set_signed_message(signed.armored.clone());
    let report = verifier.verify().await?;
    assert!(report.valid);
    assert_eq!(report.signer_fingerprint, alice.fingerprint);

    verifier.set_signed_message(signed.armored.replace("approved", "rejected"));
    let report = verifier.verify().await?;
    assert!(!report.valid);
    assert_eq!(verifier.state(), FlowState::Success);
    Ok(())
}

#[tokio::test]
async fn test_multiline_signed_text_comes_back_unchanged() -> Result<()> {
    let alice = Identity::generate("Alice", "alice@example.org").await?;
    let message = "line one\nline two\n\nline four";

    let mut signer = SignController::default();
    signer.set_message(message);
    signer.set_private_key(alice.secret_armored.clone());
    signer.set_passphrase(alice.passphrase.clone());
    let signed = signer.sign().await?;

    let mut verifier = VerifyController::default();
    verifier.set_public_key(alice.public_armored.clone());
    verifier.set_signed_message(signed.armored);
    let report = verifier.verify().await?;

    assert!(report.valid);
    assert_eq!(report.signed_text.as_deref(), Some(message));
    Ok(())
}

#[tokio::test]
async fn test_detached_sign_and_verify() -> Result<()> {
    let alice = Identity::generate("Alice", "alice@example.org").await?;
    let document = "checksum: 9f86d081884c7d659a2feaa0c55ad015";

    let mut signer = SignController::default();
    signer.set_mode(SignMode::Detached);
    signer.set_message(document);
    signer.set_private_key(alice.secret_armored.clone());
    signer.set_passphrase(alice.passphrase.clone());
    let signature = signer.sign().await?.armored;

    let mut verifier = VerifyController::default();
    verifier.set_public_key(alice.public_armored.clone());
    verifier.set_message(document);
    verifier.set_signature(signature.clone());
    assert!(verifier.verify().await?.valid);

    verifier.set_message(format!("{} ", document));
    assert!(!verifier.verify().await?.valid);
    Ok(())
}

#[tokio::test]
async fn test_verify_accepts_private_key_block() -> Result<()> {
    let alice = Identity::generate("Alice", "alice@example.org").await?;

    let mut signer = SignController::default();
    signer.set_message("signed by alice");
    signer.set_private_key(alice.secret_armored.clone());
    signer.set_passphrase(alice.passphrase.clone());
    let signed = signer.sign().await?;

    let mut verifier = VerifyController::default();
    verifier.set_public_key(alice.secret_armored.clone());
    verifier.set_signed_message(signed.armored);
    assert!(verifier.verify().await?.valid);
    Ok(())
}

#[tokio::test]
async fn test_inspect_generated_keys() -> Result<()> {
    let dana = Identity::generate("Dana", "dana@example.org").await?;

    let mut controller = InspectController::default();
    controller.set_key(dana.public_armored.clone());
    let public = controller.inspect().await?;

    controller.set_key(dana.secret_armored.clone());
    let private = controller.inspect().await?;

    assert_eq!(public.fingerprint, dana.fingerprint);
    assert_eq!(public.fingerprint, private.fingerprint);
    assert!(!public.is_private);
    assert!(private.is_private && private.is_encrypted);
    assert_eq!(public.formatted_fingerprint().split(' ').count(), 10);
    Ok(())
}
