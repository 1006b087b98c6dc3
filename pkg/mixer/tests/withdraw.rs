use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use ethereum_types::Address;
use mixer::{Error, Mixer, WithdrawOptions};
use mixer_contracts::{Ledger, MemoryLedger};
use mixer_note::{Note, NoteTag, Secret};
use mixer_primitives::Element;
use mixer_prover::{Artifacts, CircuitInput, NativeProver, Proof, Prover, ProvingSystem};
use mixer_tree::{find_leaf_index, Tree, MERKLE_TREE_HEIGHT};
use rand_chacha::{rand_core::SeedableRng, ChaChaRng};

const NETWORK_ID: u64 = 1337;

fn setup() -> (Mixer<MemoryLedger, NativeProver>, Arc<MemoryLedger>) {
    setup_with(MemoryLedger::new(NETWORK_ID))
}

fn setup_with(ledger: MemoryLedger) -> (Mixer<MemoryLedger, NativeProver>, Arc<MemoryLedger>) {
    let artifacts = artifacts();

    let verifier_artifacts = Arc::clone(&artifacts);
    let ledger = Arc::new(
        ledger.with_verifier(move |bundle| NativeProver::verify(&verifier_artifacts, bundle)),
    );

    let prover = Prover::new(artifacts, Arc::new(NativeProver));
    let mixer = Mixer::new(Arc::clone(&ledger), prover, "eth", "0.1").unwrap();

    (mixer, ledger)
}

fn artifacts() -> Arc<Artifacts> {
    Arc::new(Artifacts::from_bytes(
        b"withdraw circuit".to_vec(),
        b"withdraw proving key".to_vec(),
    ))
}

async fn deposit_n<P: ProvingSystem>(mixer: &Mixer<MemoryLedger, P>, n: usize) -> Vec<Note> {
    let mut rng = ChaChaRng::from_seed([7; 32]);
    let mut notes = Vec::with_capacity(n);

    for _ in 0..n {
        notes.push(mixer.deposit(&mut rng).await.unwrap());
    }

    notes
}

fn recipient() -> Address {
    Address::repeat_byte(0xaa)
}

#[tokio::test]
async fn withdraw_one_of_seven_deposits() {
    let (mixer, ledger) = setup();
    let notes = deposit_n(&mixer, 7).await;

    let mut events = ledger.deposit_events().await.unwrap();
    events.sort_by_key(|event| event.leaf_index);
    let leaves: Vec<_> = events.iter().map(|event| event.commitment).collect();

    let commitment = notes[4].deposit.commitment();
    assert_eq!(find_leaf_index(&leaves, commitment), Some(4));

    let proof = mixer.merkle_proof(&notes[4].deposit).await.unwrap();
    assert_eq!(proof.leaf_index, 4);
    assert_eq!(proof.path_elements.len(), MERKLE_TREE_HEIGHT);
    assert_eq!(proof.root, ledger.last_root());
    assert!(proof.proves(commitment));

    mixer
        .withdraw(&notes[4].to_string(), recipient(), WithdrawOptions::default())
        .await
        .unwrap();

    let nullifier_hash = notes[4].deposit.nullifier_hash();
    assert!(ledger.is_spent(nullifier_hash).await.unwrap());

    let again = mixer
        .withdraw(&notes[4].to_string(), recipient(), WithdrawOptions::default())
        .await;
    assert!(
        matches!(again, Err(Error::AlreadySpent(h)) if h == nullifier_hash),
        "{again:?}"
    );

    // the other deposits are unaffected
    mixer
        .withdraw(&notes[0].to_string(), recipient(), WithdrawOptions::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn notes_are_tagged_with_the_network() {
    let (mixer, _ledger) = setup();
    let note = deposit_n(&mixer, 1).await.remove(0);

    let text = note.to_string();
    let hex = text.strip_prefix("tornado-eth-0.1-1337-0x").unwrap();
    assert_eq!(hex.len(), 124);

    let fixed = mixer.clone().with_network_id(5);
    let mut rng = ChaChaRng::from_seed([8; 32]);
    let note = fixed.deposit(&mut rng).await.unwrap();
    assert_eq!(note.tag.network_id(), 5);
}

#[tokio::test]
async fn malformed_notes_are_rejected_before_proving() {
    let (mixer, ledger) = setup();
    let note = deposit_n(&mixer, 1).await.remove(0).to_string();

    let short = &note[..note.len() - 1];
    let long = format!("{note}0");

    for bad in [short, long.as_str(), "tornado-eth-0.1-1337-0x", "not a note"] {
        let result = mixer
            .withdraw(bad, recipient(), WithdrawOptions::default())
            .await;

        assert!(
            matches!(result, Err(Error::Note(mixer_note::Error::MalformedNote(_)))),
            "{bad}: {result:?}"
        );
    }

    let deposit = note.parse::<Note>().unwrap().deposit;
    assert!(!ledger.is_spent(deposit.nullifier_hash()).await.unwrap());
}

#[tokio::test]
async fn notes_from_other_networks_are_rejected() {
    let (mixer, _ledger) = setup();
    let note = deposit_n(&mixer, 1).await.remove(0);

    let other = Note::new(NoteTag::new("eth", "0.1", 1).unwrap(), note.deposit);
    let result = mixer
        .withdraw(&other.to_string(), recipient(), WithdrawOptions::default())
        .await;

    assert!(matches!(
        result,
        Err(Error::WrongNetwork {
            note: 1,
            ledger: NETWORK_ID
        })
    ));
}

#[tokio::test]
async fn out_of_order_events_are_sorted() {
    let (mixer, ledger) = setup();
    let notes = deposit_n(&mixer, 5).await;

    ledger.edit_events(|events| events.reverse());

    let proof = mixer.merkle_proof(&notes[1].deposit).await.unwrap();
    assert_eq!(proof.leaf_index, 1);
    assert_eq!(proof.root, ledger.last_root());
}

#[tokio::test]
async fn missing_events_are_inconsistent() {
    let (mixer, ledger) = setup();
    let notes = deposit_n(&mixer, 4).await;

    ledger.edit_events(|events| {
        events.remove(2);
    });

    let result = mixer.merkle_proof(&notes[0].deposit).await;
    assert!(
        matches!(
            result,
            Err(Error::InconsistentEvents {
                expected: 2,
                found: 3
            })
        ),
        "{result:?}"
    );
}

#[tokio::test]
async fn tampered_events_corrupt_the_tree() {
    let (mixer, ledger) = setup();
    let notes = deposit_n(&mixer, 3).await;

    ledger.edit_events(|events| events[1].commitment = Element::new(12345));

    let result = mixer.merkle_proof(&notes[0].deposit).await;
    assert!(matches!(result, Err(Error::TreeCorrupted { .. })), "{result:?}");
}

#[tokio::test]
async fn deposits_not_on_the_ledger_are_not_found() {
    let (mixer, _ledger) = setup();
    deposit_n(&mixer, 2).await;

    let mut rng = ChaChaRng::from_seed([9; 32]);
    let deposit = Secret::random(&mut rng).derive().unwrap();

    let result = mixer.merkle_proof(&deposit).await;
    assert!(
        matches!(result, Err(Error::LeafNotFound(c)) if c == deposit.commitment()),
        "{result:?}"
    );
}

#[tokio::test]
async fn relayer_terms_are_public_inputs() {
    let (mixer, ledger) = setup();
    let notes = deposit_n(&mixer, 2).await;

    let options = WithdrawOptions {
        relayer: Address::repeat_byte(0xbb),
        fee: Element::new(1_000),
        refund: Element::ZERO,
    };

    let bundle = mixer
        .generate_proof(&notes[1].deposit, recipient(), options)
        .await
        .unwrap();

    let hex = bundle.to_hex();
    assert_eq!(hex.args[3], format!("0x{}", "bb".repeat(20)));
    assert_eq!(hex.args[4], format!("0x{:064x}", 1_000));
    assert!(NativeProver::verify(mixer.prover().artifacts(), &bundle));

    let out_of_range = WithdrawOptions {
        fee: Element::MAX,
        ..options
    };
    let result = mixer
        .generate_proof(&notes[1].deposit, recipient(), out_of_range)
        .await;
    assert!(matches!(
        result,
        Err(Error::Prover(mixer_prover::Error::InputOutOfRange { name: "fee" }))
    ));

    mixer
        .withdraw(&notes[1].to_string(), recipient(), options)
        .await
        .unwrap();
    assert!(ledger
        .is_spent(notes[1].deposit.nullifier_hash())
        .await
        .unwrap());
}

#[tokio::test]
async fn mix_once() {
    let (mixer, ledger) = setup();
    let mut rng = ChaChaRng::from_seed([1; 32]);

    let (note, _txn_hash) = mixer.mix_once(&mut rng, recipient()).await.unwrap();

    assert!(ledger.is_spent(note.deposit.nullifier_hash()).await.unwrap());
    assert_eq!(ledger.deposit_events().await.unwrap().len(), 1);
}

async fn sorted_leaves(ledger: &MemoryLedger) -> Vec<Element> {
    let mut events = ledger.deposit_events().await.unwrap();
    events.sort_by_key(|event| event.leaf_index);
    events.iter().map(|event| event.commitment).collect()
}

#[tokio::test]
async fn repeated_proofs_reuse_cached_hashes() {
    let (mixer, ledger) = setup();
    let mut notes = deposit_n(&mixer, 5).await;
    let metrics = mixer.hash_cache().metrics();

    let first = mixer.merkle_proof(&notes[0].deposit).await.unwrap();
    let misses = metrics.cache_misses();
    assert!(misses > 0);

    let second = mixer.merkle_proof(&notes[3].deposit).await.unwrap();
    assert_eq!(metrics.cache_misses(), misses);
    assert_eq!(first.root, second.root);

    let rebuilt = Tree::<MERKLE_TREE_HEIGHT>::build(sorted_leaves(&ledger).await).unwrap();
    assert_eq!(second.root, rebuilt.root());
    assert_eq!(second.root, ledger.last_root());

    // one more deposit only dirties the nodes above it
    let mut rng = ChaChaRng::from_seed([11; 32]);
    notes.push(mixer.deposit(&mut rng).await.unwrap());

    let third = mixer.merkle_proof(&notes[5].deposit).await.unwrap();
    let misses_after_deposit = metrics.cache_misses();
    assert!(misses_after_deposit - misses <= MERKLE_TREE_HEIGHT);

    let rebuilt = Tree::<MERKLE_TREE_HEIGHT>::build(sorted_leaves(&ledger).await).unwrap();
    assert_eq!(third.root, rebuilt.root());
    assert_eq!(third.root, ledger.last_root());

    // clones share the cache
    let hits = metrics.cache_hits();
    mixer.clone().merkle_proof(&notes[1].deposit).await.unwrap();
    assert_eq!(metrics.cache_misses(), misses_after_deposit);
    assert!(metrics.cache_hits() > hits);
}

#[tokio::test]
async fn refunds_need_a_ledger_that_pays_them() {
    let options = WithdrawOptions {
        relayer: Address::repeat_byte(0xbb),
        fee: Element::new(1_000),
        refund: Element::new(500),
    };

    let (mixer, ledger) = setup();
    let note = deposit_n(&mixer, 1).await.remove(0);

    let result = mixer.withdraw(&note.to_string(), recipient(), options).await;
    assert!(
        matches!(
            result,
            Err(Error::Ledger(mixer_contracts::Error::RefundNotSupported))
        ),
        "{result:?}"
    );
    assert!(!ledger.is_spent(note.deposit.nullifier_hash()).await.unwrap());

    let (mixer, ledger) = setup_with(MemoryLedger::new(NETWORK_ID).with_refunds());
    let note = deposit_n(&mixer, 1).await.remove(0);

    mixer
        .withdraw(&note.to_string(), recipient(), options)
        .await
        .unwrap();
    assert!(ledger.is_spent(note.deposit.nullifier_hash()).await.unwrap());
}

/// Proves natively after a pause, recording when it starts and finishes
#[derive(Debug, Default)]
struct SlowProver {
    started: AtomicBool,
    finished: AtomicUsize,
}

impl ProvingSystem for SlowProver {
    fn prove<const HEIGHT: usize>(
        &self,
        artifacts: &Artifacts,
        input: &CircuitInput<HEIGHT>,
    ) -> mixer_prover::Result<Proof> {
        self.started.store(true, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(100));

        let proof = NativeProver.prove(artifacts, input);
        self.finished.fetch_add(1, Ordering::SeqCst);
        proof
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn dropped_proof_still_runs_to_completion() {
    let system = Arc::new(SlowProver::default());
    let ledger = Arc::new(MemoryLedger::new(NETWORK_ID));
    let prover = Prover::new(artifacts(), Arc::clone(&system));
    let mixer = Mixer::new(ledger, prover, "eth", "0.1").unwrap();
    let note = deposit_n(&mixer, 1).await.remove(0);

    let proving = mixer.generate_proof(&note.deposit, recipient(), WithdrawOptions::default());
    let started = async {
        while !system.started.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    };

    tokio::select! {
        result = proving => panic!("proof finished before it was dropped: {result:?}"),
        () = started => {}
    }

    assert_eq!(system.finished.load(Ordering::SeqCst), 0);

    tokio::time::timeout(Duration::from_secs(5), async {
        while system.finished.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}
