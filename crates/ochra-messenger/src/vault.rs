//! Encrypted identity key storage and session password handling (Section 4.4 / C4).
//!
//! Each identity directory holds `<fp>.dsa`, `<fp>.kem`, and optionally
//! `mnemonic.enc`. A file is either plaintext (prefixed `OCPL`) or
//! password-encrypted (prefixed `OCVL`): `magic(4) || version(1) || salt(32)
//! || nonce(12) || tag(16) || ciphertext`, with the key derived by
//! PBKDF2-HMAC-SHA256 over the password ([`ochra_crypto::pbkdf2`]) and the
//! body sealed with AES-256-GCM ([`ochra_crypto::aes256gcm`]).

use std::fs;
use std::path::{Path, PathBuf};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use ochra_crypto::pq::{DsaKeyPair, KemKeyPair};

use crate::fingerprint::Fingerprint;
use crate::{EngineError, Result};

const ENCRYPTED_MAGIC: &[u8; 4] = b"OCVL";
const PLAIN_MAGIC: &[u8; 4] = b"OCPL";
const FILE_VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1 + 32 + 12 + 16; // magic, version, salt, nonce, tag

/// Loaded identity key material, plus an optional decrypted mnemonic.
pub struct LoadedIdentity {
    pub fingerprint: Fingerprint,
    pub dsa: DsaKeyPair,
    pub kem: KemKeyPair,
    pub mnemonic: Option<Zeroizing<String>>,
}

#[derive(Serialize, Deserialize)]
struct DsaKeyFile {
    public_key: Vec<u8>,
    secret_key: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct KemKeyFile {
    public_key: Vec<u8>,
    secret_key: Vec<u8>,
}

fn identity_dir(data_dir: &Path, fp: &Fingerprint) -> PathBuf {
    data_dir.join(fp.to_hex())
}

fn dsa_path(dir: &Path, fp: &Fingerprint) -> PathBuf {
    dir.join(format!("{}.dsa", fp.to_hex()))
}

fn kem_path(dir: &Path, fp: &Fingerprint) -> PathBuf {
    dir.join(format!("{}.kem", fp.to_hex()))
}

fn mnemonic_path(dir: &Path) -> PathBuf {
    dir.join("mnemonic.enc")
}

/// Whether a key file's raw bytes carry the password-encrypted header.
pub fn is_encrypted(raw: &[u8]) -> bool {
    raw.len() >= 4 && &raw[0..4] == ENCRYPTED_MAGIC
}

fn encrypt_blob(password: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let salt = ochra_crypto::pbkdf2::generate_salt();
    let key = ochra_crypto::pbkdf2::derive_key(password, &salt).expect("pbkdf2 cannot fail");
    let mut nonce = [0u8; ochra_crypto::aes256gcm::NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    let combined =
        ochra_crypto::aes256gcm::encrypt(&key, &nonce, plaintext, b"").expect("aes-gcm encrypt");
    let split = combined.len() - ochra_crypto::aes256gcm::TAG_SIZE;
    let (ciphertext, tag) = combined.split_at(split);

    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.extend_from_slice(ENCRYPTED_MAGIC);
    out.push(FILE_VERSION);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(tag);
    out.extend_from_slice(ciphertext);
    out
}

fn decrypt_blob(password: &[u8], raw: &[u8]) -> Result<Vec<u8>> {
    if raw.len() < HEADER_LEN || raw[4] != FILE_VERSION {
        return Err(EngineError::Internal("corrupt key file header".into()));
    }
    let salt: [u8; 32] = raw[5..37].try_into().unwrap();
    let nonce: [u8; 12] = raw[37..49].try_into().unwrap();
    let tag = &raw[49..65];
    let ciphertext = &raw[65..];

    let key = ochra_crypto::pbkdf2::derive_key(password, &salt)
        .map_err(|e| EngineError::Internal(e.to_string()))?;
    let mut combined = Vec::with_capacity(ciphertext.len() + tag.len());
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);
    ochra_crypto::aes256gcm::decrypt(&key, &nonce, &combined, b"").map_err(|_| EngineError::WrongPassword)
}

fn encode_key_file(password: Option<&[u8]>, plaintext: &[u8]) -> Vec<u8> {
    match password {
        Some(pw) => encrypt_blob(pw, plaintext),
        None => {
            let mut out = Vec::with_capacity(5 + plaintext.len());
            out.extend_from_slice(PLAIN_MAGIC);
            out.push(FILE_VERSION);
            out.extend_from_slice(plaintext);
            out
        }
    }
}

fn decode_key_file(raw: &[u8], password: Option<&[u8]>) -> Result<Vec<u8>> {
    if is_encrypted(raw) {
        let pw = password.ok_or(EngineError::PasswordRequired)?;
        decrypt_blob(pw, raw)
    } else if raw.len() >= 5 && &raw[0..4] == PLAIN_MAGIC {
        Ok(raw[5..].to_vec())
    } else {
        Err(EngineError::Internal("unrecognized key file format".into()))
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| EngineError::Internal(e.to_string()))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| EngineError::Internal(e.to_string()))
}

/// Create a fresh identity: generate DSA + KEM key pairs, derive the
/// fingerprint, and persist both key files (optionally password-encrypted).
pub fn create_identity(data_dir: &Path, password: Option<&str>) -> Result<LoadedIdentity> {
    let dsa = DsaKeyPair::generate();
    let kem = KemKeyPair::generate();
    let fingerprint = Fingerprint::from_dsa_public_key(&dsa.public_key);
    let dir = identity_dir(data_dir, &fingerprint);
    fs::create_dir_all(&dir).map_err(|e| EngineError::Internal(e.to_string()))?;

    let pw = password.map(str::as_bytes);

    let dsa_file = DsaKeyFile {
        public_key: dsa.public_key.clone(),
        secret_key: dsa.secret_key_bytes().to_vec(),
    };
    let kem_file = KemKeyFile {
        public_key: kem.public_key.clone(),
        secret_key: kem.secret_key_bytes().to_vec(),
    };

    write_file(
        &dsa_path(&dir, &fingerprint),
        &encode_key_file(
            pw,
            &serde_json::to_vec(&dsa_file).map_err(|e| EngineError::Internal(e.to_string()))?,
        ),
    )?;
    write_file(
        &kem_path(&dir, &fingerprint),
        &encode_key_file(
            pw,
            &serde_json::to_vec(&kem_file).map_err(|e| EngineError::Internal(e.to_string()))?,
        ),
    )?;

    Ok(LoadedIdentity {
        fingerprint,
        dsa,
        kem,
        mnemonic: None,
    })
}

/// Load an existing identity, decrypting its key files if needed.
///
/// Detection happens on the `.kem` file first, per Section 4.4: a missing
/// password on an encrypted file is `PasswordRequired`; a wrong password is
/// `WrongPassword`, surfaced before any other side effect.
pub fn load_identity(
    data_dir: &Path,
    fingerprint: Fingerprint,
    password: Option<&str>,
) -> Result<LoadedIdentity> {
    let dir = identity_dir(data_dir, &fingerprint);
    let kem_raw = fs::read(kem_path(&dir, &fingerprint))
        .map_err(|_| EngineError::NotFound(format!("identity {fingerprint}")))?;

    if is_encrypted(&kem_raw) && password.is_none() {
        return Err(EngineError::PasswordRequired);
    }

    let pw = password.map(str::as_bytes);
    let kem_plain = decode_key_file(&kem_raw, pw)?;
    let dsa_raw = read_file(&dsa_path(&dir, &fingerprint))?;
    let dsa_plain = decode_key_file(&dsa_raw, pw)?;

    let dsa_file: DsaKeyFile =
        serde_json::from_slice(&dsa_plain).map_err(|e| EngineError::Internal(e.to_string()))?;
    let kem_file: KemKeyFile =
        serde_json::from_slice(&kem_plain).map_err(|e| EngineError::Internal(e.to_string()))?;

    let dsa = DsaKeyPair::from_secret_bytes(&dsa_file.public_key, &dsa_file.secret_key)?;
    let kem = KemKeyPair::from_secret_bytes(&kem_file.secret_key)?;

    let mnemonic = {
        let path = mnemonic_path(&dir);
        if path.exists() {
            let raw = read_file(&path)?;
            let plain = decode_key_file(&raw, pw)?;
            Some(Zeroizing::new(String::from_utf8_lossy(&plain).into_owned()))
        } else {
            None
        }
    };

    Ok(LoadedIdentity {
        fingerprint,
        dsa,
        kem,
        mnemonic,
    })
}

/// Re-wrap every present key file under `new_password`, rolling back to
/// `old_password` if any step fails partway through (Section 4.4).
pub fn change_password(
    data_dir: &Path,
    fingerprint: Fingerprint,
    old_password: Option<&str>,
    new_password: Option<&str>,
) -> Result<()> {
    let dir = identity_dir(data_dir, &fingerprint);
    let candidates = [
        dsa_path(&dir, &fingerprint),
        kem_path(&dir, &fingerprint),
        mnemonic_path(&dir),
    ];
    let old_pw = old_password.map(str::as_bytes);
    let new_pw = new_password.map(str::as_bytes);

    let mut backups: Vec<(PathBuf, Vec<u8>)> = Vec::new();
    for path in candidates.iter() {
        if !path.exists() {
            continue;
        }
        let original = match read_file(path) {
            Ok(b) => b,
            Err(e) => {
                rollback(&backups);
                return Err(e);
            }
        };
        let plaintext = match decode_key_file(&original, old_pw) {
            Ok(p) => p,
            Err(e) => {
                rollback(&backups);
                return Err(e);
            }
        };
        let rewrapped = encode_key_file(new_pw, &plaintext);
        if let Err(e) = write_file(path, &rewrapped) {
            rollback(&backups);
            return Err(e);
        }
        backups.push((path.clone(), original));
    }
    Ok(())
}

fn rollback(backups: &[(PathBuf, Vec<u8>)]) {
    for (path, original) in backups {
        let _ = fs::write(path, original);
    }
}

/// Validate `fp`, then remove the identity directory and its per-identity
/// SQLite files. Best-effort on the SQLite files: a missing file is not an
/// error.
pub fn delete_identity_sync(data_dir: &Path, fp: &str) -> Result<()> {
    if !Fingerprint::is_valid(fp) {
        return Err(EngineError::InvalidArg(
            "fingerprint must be 128 hex chars".into(),
        ));
    }
    let fingerprint = Fingerprint::parse(fp)?;
    let dir = identity_dir(data_dir, &fingerprint);
    if dir.exists() {
        fs::remove_dir_all(&dir).map_err(|e| EngineError::Internal(e.to_string()))?;
    }
    for suffix in ["_contacts.db", "_profiles.db", "_groups.db"] {
        let path = data_dir.join(format!("{fp}{suffix}"));
        if path.exists() {
            let _ = fs::remove_file(&path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ochra-messenger-vault-test-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_create_and_load_unencrypted() {
        let dir = tmp_dir("unencrypted");
        let created = create_identity(&dir, None).expect("create");
        let loaded = load_identity(&dir, created.fingerprint, None).expect("load");
        assert_eq!(loaded.fingerprint, created.fingerprint);
    }

    #[test]
    fn test_create_and_load_with_password() {
        let dir = tmp_dir("password");
        let created = create_identity(&dir, Some("P@ss1")).expect("create");
        let loaded = load_identity(&dir, created.fingerprint, Some("P@ss1")).expect("load");
        assert_eq!(loaded.fingerprint, created.fingerprint);
    }

    #[test]
    fn test_load_missing_password_fails() {
        let dir = tmp_dir("missing-password");
        let created = create_identity(&dir, Some("P@ss1")).expect("create");
        let err = load_identity(&dir, created.fingerprint, None).unwrap_err();
        assert!(matches!(err, EngineError::PasswordRequired));
    }

    #[test]
    fn test_load_wrong_password_fails() {
        let dir = tmp_dir("wrong-password");
        let created = create_identity(&dir, Some("P@ss1")).expect("create");
        let err = load_identity(&dir, created.fingerprint, Some("wrong")).unwrap_err();
        assert!(matches!(err, EngineError::WrongPassword));
    }

    #[test]
    fn test_change_password_roundtrip() {
        let dir = tmp_dir("change-password");
        let created = create_identity(&dir, Some("old-pw")).expect("create");
        change_password(&dir, created.fingerprint, Some("old-pw"), Some("new-pw")).expect("change");
        assert!(load_identity(&dir, created.fingerprint, Some("old-pw")).is_err());
        assert!(load_identity(&dir, created.fingerprint, Some("new-pw")).is_ok());
    }

    #[test]
    fn test_change_password_wrong_old_password_is_noop() {
        let dir = tmp_dir("change-password-rollback");
        let created = create_identity(&dir, Some("old-pw")).expect("create");
        let err = change_password(&dir, created.fingerprint, Some("incorrect"), Some("new-pw")).unwrap_err();
        assert!(matches!(err, EngineError::WrongPassword));
        // Old password must still work.
        assert!(load_identity(&dir, created.fingerprint, Some("old-pw")).is_ok());
    }

    #[test]
    fn test_delete_identity_removes_directory() {
        let dir = tmp_dir("delete");
        let created = create_identity(&dir, None).expect("create");
        delete_identity_sync(&dir, &created.fingerprint.to_hex()).expect("delete");
        assert!(load_identity(&dir, created.fingerprint, None).is_err());
    }

    #[test]
    fn test_delete_rejects_invalid_fingerprint() {
        let dir = tmp_dir("delete-invalid");
        let err = delete_identity_sync(&dir, "not-a-fingerprint").unwrap_err();
        assert!(matches!(err, EngineError::InvalidArg(_)));
    }
}
