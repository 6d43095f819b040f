//! Notification records emitted after committed state changes

use super::contract::Contract;
use super::document::{Document, DocumentStatus};
use shared_types::{NewNotification, NotificationKind, SignerKey};

const DOCUMENT_ID: &str = "documentId";
const CONTRACT_ID: &str = "contractId";
const EVENT: &str = "event";

fn document_notice(doc: &Document, to: &SignerKey, event: &str, message: String) -> NewNotification {
    NewNotification::new(to.clone(), NotificationKind::Document, message)
        .with_meta(DOCUMENT_ID, doc.key.0.to_string())
        .with_meta(EVENT, event)
}

fn contract_notice(
    contract: &Contract,
    to: &SignerKey,
    event: &str,
    message: String,
) -> NewNotification {
    NewNotification::new(to.clone(), NotificationKind::Contract, message)
        .with_meta(CONTRACT_ID, contract.key.0.to_string())
        .with_meta(EVENT, event)
}

fn push_unique(list: &mut Vec<SignerKey>, key: &SignerKey) {
    if !list.contains(key) {
        list.push(key.clone());
    }
}

/// Every required signer is asked to sign.
pub fn signature_requested(doc: &Document) -> Vec<NewNotification> {
    doc.required_signers
        .iter()
        .map(|s| {
            document_notice(
                doc,
                s,
                "signature_requested",
                format!("You have been asked to sign {}", doc.name),
            )
        })
        .collect()
}

/// Recipients of a signature event.
///
/// While waiting: owner plus signers still pending, minus the actor.
/// The actor is left out on purpose, even when it is the owner; it already
/// has the result of its own call.
/// On finalization: owner plus every required signer, actor included.
pub fn signature_audience(doc: &Document, actor: &SignerKey) -> Vec<SignerKey> {
    let mut audience = Vec::new();
    if doc.status == DocumentStatus::Finalized {
        push_unique(&mut audience, &doc.owner);
        for s in &doc.required_signers {
            push_unique(&mut audience, s);
        }
        return audience;
    }

    if &doc.owner != actor {
        push_unique(&mut audience, &doc.owner);
    }
    for s in doc.pending_signers().filter(|s| *s != actor) {
        push_unique(&mut audience, s);
    }
    audience
}

pub fn signed(doc: &Document, actor: &SignerKey) -> Vec<NewNotification> {
    let (event, message) = if doc.status == DocumentStatus::Finalized {
        ("finalized", format!("{} has been signed by all parties", doc.name))
    } else {
        ("signed", format!("{actor} signed {}", doc.name))
    };
    signature_audience(doc, actor)
        .iter()
        .map(|to| document_notice(doc, to, event, message.clone()))
        .collect()
}

pub fn rejected(doc: &Document, actor: &SignerKey) -> Vec<NewNotification> {
    vec![document_notice(
        doc,
        &doc.owner,
        "rejected",
        format!("{actor} rejected {}", doc.name),
    )]
}

pub fn cancelled(doc: &Document) -> Vec<NewNotification> {
    doc.required_signers
        .iter()
        .map(|s| document_notice(doc, s, "cancelled", format!("{} was cancelled", doc.name)))
        .collect()
}

pub fn expired(doc: &Document) -> Vec<NewNotification> {
    vec![document_notice(
        doc,
        &doc.owner,
        "expired",
        format!("{} expired before all signatures were collected", doc.name),
    )]
}

pub fn clause_added(contract: &Contract, clause_id: &str) -> Vec<NewNotification> {
    let mut notices = vec![contract_notice(
        contract,
        &contract.owner,
        "clause_added",
        "Clause added successfully".to_string(),
    )
    .with_meta("clauseId", clause_id)];
    for p in contract.participants.iter().filter(|p| **p != contract.owner) {
        notices.push(
            contract_notice(
                contract,
                p,
                "clause_added",
                "A new clause has been added to the contract you are participating in."
                    .to_string(),
            )
            .with_meta("clauseId", clause_id),
        );
    }
    notices
}

pub fn contract_created(contract: &Contract) -> Vec<NewNotification> {
    let mut notices = vec![contract_notice(
        contract,
        &contract.owner,
        "created",
        format!("Contract {} created", contract.name),
    )];
    for p in contract.participants.iter().filter(|p| **p != contract.owner) {
        notices.extend(participant_added(contract, p));
    }
    notices
}

pub fn participant_added(contract: &Contract, participant: &SignerKey) -> Vec<NewNotification> {
    vec![contract_notice(
        contract,
        participant,
        "participant_added",
        format!("You have been added to contract {}", contract.name),
    )]
}

pub fn contract_cancelled(contract: &Contract) -> Vec<NewNotification> {
    contract
        .audience()
        .iter()
        .map(|to| {
            contract_notice(
                contract,
                to,
                "cancelled",
                format!("Contract {} was cancelled", contract.name),
            )
        })
        .collect()
}

pub fn clauses_executed(contract: &Contract, clause_ids: &[String]) -> Vec<NewNotification> {
    let message = if contract.status.is_terminal() {
        format!("Contract {} has been fully executed", contract.name)
    } else {
        format!(
            "{} clause(s) executed on contract {}",
            clause_ids.len(),
            contract.name
        )
    };
    contract
        .audience()
        .iter()
        .map(|to| {
            contract_notice(contract, to, "executed", message.clone())
                .with_meta("clauseIds", clause_ids.join(","))
        })
        .collect()
}
