// Copyright (c) Facebook, Inc. and its affiliates.
// Modifications Copyright (c) 2022-2023 Bolt Labs Holdings, Inc
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

use super::{
    messages::{join_round1, join_round2, join_round3, Round1Message, Round2Message, Round3Message},
    Signature, Status,
};
use crate::{
    curve::CurvePoint,
    errors::{Error, Result},
    keygen::{KeyMeta, KeyShare},
    l2fhe::{EncryptedL1, EncryptedL2},
    utils::{bn_mod, bn_pow, hash_to_int, random_in_range, random_positive_bn},
    zkp::{
        sign::{SigRoundInput, SigRoundProof, SigRoundSecret},
        Proof,
    },
};
use rand::{CryptoRng, RngCore};
use tracing::info;
use unknown_order::BigNumber;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The secrets a participant holds between Round 1 and Round 2. Wiped as
/// soon as the session advances or is dropped.
#[derive(ZeroizeOnDrop)]
struct RoundOneState {
    k: BigNumber,
    rho: BigNumber,
    c: BigNumber,
}

/// Each state owns exactly the data its successor round needs.
enum State {
    NotInited,
    Round1(RoundOneState),
    Round2 {
        u: EncryptedL1,
        r_point: CurvePoint,
        r: BigNumber,
        z: EncryptedL2,
    },
    Round3 {
        sigma: EncryptedL2,
        r: BigNumber,
    },
    Finished {
        r: BigNumber,
        s: BigNumber,
    },
}

impl State {
    fn status(&self) -> Status {
        match self {
            State::NotInited => Status::NotInited,
            State::Round1(_) => Status::Round1,
            State::Round2 { .. } => Status::Round2,
            State::Round3 { .. } => Status::Round3,
            State::Finished { .. } => Status::Finished,
        }
    }
}

/// A signing session for one message. Ephemeral: it lives only while the
/// signature is being created, and owns nothing but per-signature data.
/// Dropping the session wipes the Round 1 secrets.
pub struct SigSession<'a> {
    share: &'a KeyShare,
    meta: &'a KeyMeta,
    /// The hashed message, reduced to the scalar field.
    m: BigNumber,
    /// The deterministic encryption of `m`; identical for every
    /// participant.
    enc_m: EncryptedL1,
    state: State,
}

impl KeyShare {
    /// Open a signing session for a document. Returns the session and the
    /// document digest (computed with the key's configured hash).
    pub fn new_sig_session<'a>(
        &'a self,
        meta: &'a KeyMeta,
        doc: &[u8],
    ) -> Result<(SigSession<'a>, Vec<u8>)> {
        self.joint()?;
        let digest = meta.hash().digest(doc);
        let m = hash_to_int(&digest, &meta.q());
        let one = BigNumber::one();
        let enc_m = meta.pk().encrypt_fixed(&m, &one, &one)?;
        Ok((
            SigSession {
                share: self,
                meta,
                m,
                enc_m,
                state: State::NotInited,
            },
            digest,
        ))
    }
}

impl SigSession<'_> {
    /// The session's current state.
    pub fn status(&self) -> Status {
        self.state.status()
    }

    /// The hashed message this session signs, as a scalar-field integer.
    pub fn hashed_message(&self) -> &BigNumber {
        &self.m
    }

    fn expect(&self, expected: Status) -> Result<()> {
        let actual = self.status();
        if actual != expected {
            return Err(Error::InvalidState { expected, actual });
        }
        Ok(())
    }

    /// Round 1: commit to fresh per-signature randomness. Samples
    /// `k, rho <- [0, q)` and `c <- [-q^6, q^6)`, broadcasts `R_i = k * G`
    /// and the three encryptions with a proof of consistency.
    pub fn round1<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<Round1Message> {
        self.expect(Status::NotInited)?;
        let q = self.meta.q();
        let q6 = bn_pow(&q, 6);

        let k = random_positive_bn(rng, &q);
        let rho = random_positive_bn(rng, &q);
        let c = random_in_range(rng, &-q6.clone(), &q6);

        let r_i = CurvePoint::base_mul(self.meta.curve(), &k)?;
        let (u_i, mut nonce_rho) = self.meta.pk().encrypt(rng, &rho)?;
        let (v_i, mut nonce_k) = self.meta.pk().encrypt(rng, &k)?;
        let (w_i, mut nonce_c) = self.meta.pk().encrypt(rng, &c)?;

        let input = SigRoundInput::new(
            self.meta.pk(),
            self.meta.zk(),
            self.meta.curve(),
            &r_i,
            &v_i,
            &u_i,
            &w_i,
        );
        let secret = SigRoundSecret::new(&k, &rho, &c, &nonce_k, &nonce_rho, &nonce_c);
        let proof = SigRoundProof::prove(rng, &input, &secret)?;
        nonce_k.zeroize();
        nonce_rho.zeroize();
        nonce_c.zeroize();

        self.state = State::Round1(RoundOneState { k, rho, c });
        Ok(Round1Message {
            from: self.share.index(),
            r_i,
            u_i,
            v_i,
            w_i,
            proof,
        })
    }

    /// Round 2: aggregate the first `K` valid Round 1 messages, derive the
    /// nonce point `R` and the blinded nonce product
    /// `z = Enc(k * rho + q * c)`, and emit a partial decryption of `z`.
    pub fn round2<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        msgs: &[Round1Message],
    ) -> Result<Round2Message> {
        self.expect(Status::Round1)?;
        let pk = self.meta.pk();
        let q = self.meta.q();

        let (r_point, u, v, w) = join_round1(self.meta, msgs)?;
        let r = bn_mod(&r_point.x(), &q);
        if r == BigNumber::zero() {
            return Err(Error::Degenerate("R.x mod q is zero"));
        }

        let uv = pk.mul(&v, &u)?;
        let qw = pk.mul_const_l1(&w, &q)?;
        let qw_l2 = pk.to_l2(&qw)?;
        let z = pk.add_l2(&[&uv, &qw_l2])?;

        let (pd_z, proof) = pk.partial_decrypt_l2(rng, &self.share.paillier, &z)?;

        info!(party = self.share.index(), "signing round 2 complete");
        self.state = State::Round2 { u, r_point, r, z };
        Ok(Round2Message {
            from: self.share.index(),
            pd_z,
            proof,
        })
    }

    /// Round 3: combine the partial decryptions of `z` into
    /// `nu = k * rho mod q`, derive `sigma = Enc((m + r * x) / k)`, and
    /// emit a partial decryption of `sigma`.
    pub fn round3<R: RngCore + CryptoRng>(
        &mut self,
        rng: &mut R,
        msgs: &[Round2Message],
    ) -> Result<Round3Message> {
        self.expect(Status::Round2)?;
        let pk = self.meta.pk();
        let q = self.meta.q();

        let (v_hat, r) = match &self.state {
            State::Round2 { u, r, z, .. } => {
                let nu = join_round2(self.meta, z, msgs)?;
                if nu == BigNumber::zero() {
                    return Err(Error::Degenerate("nu mod q is zero"));
                }
                let psi = nu.invert(&q).ok_or(Error::CouldNotInvertBigNumber)?;
                (pk.mul_const_l1(u, &psi)?, r.clone())
            }
            _ => return Err(Error::InternalInvariantFailed),
        };

        let r_alpha = pk.mul_const_l1(&self.share.joint()?.alpha, &r)?;
        let r_alpha_plus_m = pk.add_l1(&[&r_alpha, &self.enc_m])?;
        let sigma = pk.mul(&r_alpha_plus_m, &v_hat)?;

        let (pd_sigma, proof) = pk.partial_decrypt_l2(rng, &self.share.paillier, &sigma)?;

        info!(party = self.share.index(), "signing round 3 complete");
        self.state = State::Round3 { sigma, r };
        Ok(Round3Message {
            from: self.share.index(),
            pd_sigma,
            proof,
        })
    }

    /// Combine the partial decryptions of `sigma` into the signature. Once
    /// the session is finished, further calls return the cached pair
    /// without touching the messages.
    pub fn get_signature(&mut self, msgs: &[Round3Message]) -> Result<Signature> {
        if let State::Finished { r, s } = &self.state {
            return Ok(Signature::new(r.clone(), s.clone()));
        }
        self.expect(Status::Round3)?;

        let (r, s) = match &self.state {
            State::Round3 { sigma, r } => {
                let s = join_round3(self.meta, sigma, msgs)?;
                if s == BigNumber::zero() {
                    return Err(Error::Degenerate("s is zero"));
                }
                (r.clone(), s)
            }
            _ => return Err(Error::InternalInvariantFailed),
        };

        info!(party = self.share.index(), "signature complete");
        self.state = State::Finished {
            r: r.clone(),
            s: s.clone(),
        };
        Ok(Signature::new(r, s))
    }
}
