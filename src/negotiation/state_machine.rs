use std::collections::VecDeque;

use crate::log::LogLevel;
use crate::negotiation::negotiation_action::NegotiationAction;
use crate::negotiation::negotiation_error::NegotiationError;
use crate::negotiation::negotiation_event::NegotiationEvent;
use crate::negotiation::role::Role;
use crate::negotiation::signaling_state::SignalingState;
use crate::signaling::protocol::{IceCandidate, SessionDescription, SignalingMsg};

/// Remote candidates held while no remote description is set.
pub const MAX_CANDIDATE_BACKLOG: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Offer,
    Answer,
}

/// The one asynchronous step in flight, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingOp {
    epoch: u64,
    kind: PendingKind,
}

/// What a rollback returns to.
#[derive(Debug, Clone)]
struct StablePoint {
    signaling: SignalingState,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
}

/// Everything the perfect-negotiation algorithm remembers about one session.
#[derive(Debug, Clone)]
pub struct NegotiationState {
    role: Role,
    signaling: SignalingState,
    making_offer: bool,
    ignore_offer: bool,
    renegotiation_pending: bool,
    next_epoch: u64,
    pending_op: Option<PendingOp>,
    current_local: Option<SessionDescription>,
    current_remote: Option<SessionDescription>,
    pending_local: Option<SessionDescription>,
    pending_remote: Option<SessionDescription>,
    stable_point: StablePoint,
    candidate_backlog: VecDeque<IceCandidate>,
}

impl NegotiationState {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            signaling: SignalingState::Idle,
            making_offer: false,
            ignore_offer: false,
            renegotiation_pending: false,
            next_epoch: 1,
            pending_op: None,
            current_local: None,
            current_remote: None,
            pending_local: None,
            pending_remote: None,
            stable_point: StablePoint {
                signaling: SignalingState::Idle,
                local: None,
                remote: None,
            },
            candidate_backlog: VecDeque::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_polite(&self) -> bool {
        self.role.is_polite()
    }

    pub fn signaling(&self) -> SignalingState {
        self.signaling
    }

    pub fn making_offer(&self) -> bool {
        self.making_offer
    }

    pub fn ignore_offer(&self) -> bool {
        self.ignore_offer
    }

    /// A negotiation need is waiting for the machine to become stable.
    pub fn renegotiation_pending(&self) -> bool {
        self.renegotiation_pending
    }

    pub fn current_local(&self) -> Option<&SessionDescription> {
        self.current_local.as_ref()
    }

    pub fn current_remote(&self) -> Option<&SessionDescription> {
        self.current_remote.as_ref()
    }

    pub fn has_remote_description(&self) -> bool {
        self.current_remote.is_some() || self.pending_remote.is_some()
    }

    pub fn backlog_len(&self) -> usize {
        self.candidate_backlog.len()
    }

    pub fn is_closed(&self) -> bool {
        self.signaling == SignalingState::Closed
    }

    /// Stable with nothing in flight and nothing deferred.
    pub fn is_settled(&self) -> bool {
        self.signaling.is_stable()
            && self.pending_op.is_none()
            && !self.making_offer
            && !self.renegotiation_pending
    }

    fn alloc_epoch(&mut self) -> u64 {
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        epoch
    }

    fn leave_stable(&mut self) {
        if self.signaling.is_stable() {
            self.stable_point = StablePoint {
                signaling: self.signaling,
                local: self.current_local.clone(),
                remote: self.current_remote.clone(),
            };
        }
    }

    fn restore_stable(&mut self) {
        self.signaling = self.stable_point.signaling;
        self.current_local = self.stable_point.local.clone();
        self.current_remote = self.stable_point.remote.clone();
        self.pending_local = None;
        self.pending_remote = None;
    }

    /// Drops the in-flight step; an abandoned offer is remembered.
    fn abandon_pending_op(&mut self) {
        if let Some(op) = self.pending_op.take()
            && op.kind == PendingKind::Offer
        {
            self.renegotiation_pending = true;
        }
        self.making_offer = false;
    }
}

/// The perfect-negotiation reducer.
///
/// Pure: the returned actions are the only side effects, to be executed in
/// order. Once `Closed`, every event is ignored.
pub fn reduce(
    mut state: NegotiationState,
    event: NegotiationEvent,
) -> (NegotiationState, Vec<NegotiationAction>) {
    let mut actions = Vec::new();

    if state.is_closed() {
        if !matches!(
            event,
            NegotiationEvent::Hangup | NegotiationEvent::LocalCandidate(_)
        ) {
            log(
                &mut actions,
                LogLevel::Debug,
                format!("{} ignored: session closed", event.name()),
            );
        }
        return (state, actions);
    }

    match event {
        NegotiationEvent::NegotiationNeeded => on_negotiation_needed(&mut state, &mut actions),
        NegotiationEvent::OfferCreated { epoch, description } => {
            on_offer_created(&mut state, &mut actions, epoch, description);
        }
        NegotiationEvent::AnswerCreated { epoch, description } => {
            on_answer_created(&mut state, &mut actions, epoch, description);
        }
        NegotiationEvent::DescriptionFailed { epoch, reason } => {
            on_description_failed(&mut state, &mut actions, epoch, reason);
        }
        NegotiationEvent::ApplyFailed { reason } => on_apply_failed(&mut state, &mut actions, reason),
        NegotiationEvent::RemoteOffer(desc) => on_remote_offer(&mut state, &mut actions, desc),
        NegotiationEvent::RemoteAnswer(desc) => on_remote_answer(&mut state, &mut actions, desc),
        NegotiationEvent::RemoteCandidate(cand) => {
            on_remote_candidate(&mut state, &mut actions, cand);
        }
        NegotiationEvent::LocalCandidate(cand) => {
            actions.push(NegotiationAction::Send(SignalingMsg::IceCandidate(cand)));
        }
        NegotiationEvent::Hangup => on_hangup(&mut state, &mut actions),
    }

    (state, actions)
}

fn log(actions: &mut Vec<NegotiationAction>, level: LogLevel, text: String) {
    actions.push(NegotiationAction::Log { level, text });
}

fn on_negotiation_needed(state: &mut NegotiationState, actions: &mut Vec<NegotiationAction>) {
    if state.making_offer || !state.signaling.is_stable() || state.pending_op.is_some() {
        state.renegotiation_pending = true;
        log(
            actions,
            LogLevel::Debug,
            format!(
                "negotiation deferred (making_offer={}, state={})",
                state.making_offer, state.signaling
            ),
        );
        return;
    }

    state.renegotiation_pending = false;
    state.making_offer = true;
    let epoch = state.alloc_epoch();
    state.pending_op = Some(PendingOp {
        epoch,
        kind: PendingKind::Offer,
    });
    actions.push(NegotiationAction::CreateOffer { epoch });
}

/// Re-enters a deferred negotiation once the machine is stable again.
fn resume_deferred(state: &mut NegotiationState, actions: &mut Vec<NegotiationAction>) {
    if state.renegotiation_pending && state.signaling.is_stable() {
        log(actions, LogLevel::Debug, "resuming deferred negotiation".into());
        on_negotiation_needed(state, actions);
    }
}

fn on_offer_created(
    state: &mut NegotiationState,
    actions: &mut Vec<NegotiationAction>,
    epoch: u64,
    desc: SessionDescription,
) {
    let expected = PendingOp {
        epoch,
        kind: PendingKind::Offer,
    };
    if state.pending_op != Some(expected) {
        actions.push(NegotiationAction::Report(NegotiationError::StaleDescription {
            what: "offer completion",
        }));
        return;
    }
    state.pending_op = None;
    state.making_offer = false;

    state.leave_stable();
    state.pending_local = Some(desc.clone());
    state.signaling = SignalingState::HaveLocalOffer;

    log(
        actions,
        LogLevel::Debug,
        format!("sending offer ({} bytes of sdp)", desc.sdp.len()),
    );
    actions.push(NegotiationAction::ApplyLocal(desc.clone()));
    actions.push(NegotiationAction::Send(SignalingMsg::Offer(desc)));
}

fn on_answer_created(
    state: &mut NegotiationState,
    actions: &mut Vec<NegotiationAction>,
    epoch: u64,
    desc: SessionDescription,
) {
    let expected = PendingOp {
        epoch,
        kind: PendingKind::Answer,
    };
    if state.pending_op != Some(expected) || state.signaling != SignalingState::HaveRemoteOffer {
        actions.push(NegotiationAction::Report(NegotiationError::StaleDescription {
            what: "answer completion",
        }));
        return;
    }
    state.pending_op = None;

    state.current_remote = state.pending_remote.take();
    state.current_local = Some(desc.clone());
    state.pending_local = None;
    state.signaling = SignalingState::Stable;

    log(
        actions,
        LogLevel::Debug,
        format!("sending answer ({} bytes of sdp)", desc.sdp.len()),
    );
    actions.push(NegotiationAction::ApplyLocal(desc.clone()));
    actions.push(NegotiationAction::Send(SignalingMsg::Answer(desc)));
    resume_deferred(state, actions);
}

fn on_description_failed(
    state: &mut NegotiationState,
    actions: &mut Vec<NegotiationAction>,
    epoch: u64,
    reason: String,
) {
    let op = match state.pending_op {
        Some(op) if op.epoch == epoch => op,
        _ => {
            actions.push(NegotiationAction::Report(NegotiationError::StaleDescription {
                what: "failed completion",
            }));
            return;
        }
    };
    state.pending_op = None;

    match op.kind {
        PendingKind::Offer => {
            state.making_offer = false;
            actions.push(NegotiationAction::Report(NegotiationError::OfferFailed(reason)));
        }
        PendingKind::Answer => {
            actions.push(NegotiationAction::Rollback);
            state.restore_stable();
            actions.push(NegotiationAction::Report(NegotiationError::AnswerFailed(reason)));
        }
    }
}

fn on_apply_failed(state: &mut NegotiationState, actions: &mut Vec<NegotiationAction>, reason: String) {
    actions.push(NegotiationAction::Rollback);
    state.abandon_pending_op();
    state.restore_stable();
    actions.push(NegotiationAction::Report(NegotiationError::ApplyFailed(reason)));
}

fn on_remote_offer(
    state: &mut NegotiationState,
    actions: &mut Vec<NegotiationAction>,
    desc: SessionDescription,
) {
    // A redelivered offer that is already answered.
    if state.signaling.is_stable()
        && state.pending_op.is_none()
        && !state.making_offer
        && state.current_remote.as_ref() == Some(&desc)
    {
        actions.push(NegotiationAction::Report(NegotiationError::StaleDescription {
            what: "offer",
        }));
        return;
    }

    let offer_collision = state.making_offer || !state.signaling.is_stable();
    state.ignore_offer = offer_collision && !state.is_polite();
    if state.ignore_offer {
        actions.push(NegotiationAction::Report(NegotiationError::CollisionDrop));
        return;
    }

    if offer_collision {
        log(
            actions,
            LogLevel::Info,
            format!("offer collision in {}: rolling back (polite)", state.signaling),
        );
        match state.signaling {
            SignalingState::HaveLocalOffer => {
                state.renegotiation_pending = true;
                actions.push(NegotiationAction::Rollback);
                state.restore_stable();
            }
            SignalingState::HaveRemoteOffer => {
                actions.push(NegotiationAction::Rollback);
                state.restore_stable();
            }
            _ => {}
        }
        state.abandon_pending_op();
    }

    state.leave_stable();
    state.pending_remote = Some(desc.clone());
    state.signaling = SignalingState::HaveRemoteOffer;
    actions.push(NegotiationAction::ApplyRemote(desc));
    flush_backlog(state, actions);

    let epoch = state.alloc_epoch();
    state.pending_op = Some(PendingOp {
        epoch,
        kind: PendingKind::Answer,
    });
    actions.push(NegotiationAction::CreateAnswer { epoch });
}

fn on_remote_answer(
    state: &mut NegotiationState,
    actions: &mut Vec<NegotiationAction>,
    desc: SessionDescription,
) {
    if state.signaling != SignalingState::HaveLocalOffer {
        actions.push(NegotiationAction::Report(NegotiationError::StaleDescription {
            what: "answer",
        }));
        return;
    }

    state.current_local = state.pending_local.take();
    state.current_remote = Some(desc.clone());
    state.pending_remote = None;
    state.signaling = SignalingState::Stable;

    actions.push(NegotiationAction::ApplyRemote(desc));
    flush_backlog(state, actions);
    resume_deferred(state, actions);
}

fn on_remote_candidate(
    state: &mut NegotiationState,
    actions: &mut Vec<NegotiationAction>,
    cand: IceCandidate,
) {
    if state.has_remote_description() {
        actions.push(NegotiationAction::AddCandidate(cand));
        return;
    }

    if state.candidate_backlog.len() >= MAX_CANDIDATE_BACKLOG {
        state.candidate_backlog.pop_front();
        log(
            actions,
            LogLevel::Warn,
            "candidate backlog full; dropping oldest".into(),
        );
    }
    state.candidate_backlog.push_back(cand);
    log(
        actions,
        LogLevel::Trace,
        format!(
            "buffered remote candidate ({} pending)",
            state.candidate_backlog.len()
        ),
    );
}

fn flush_backlog(state: &mut NegotiationState, actions: &mut Vec<NegotiationAction>) {
    if state.candidate_backlog.is_empty() {
        return;
    }
    log(
        actions,
        LogLevel::Debug,
        format!(
            "flushing {} buffered remote candidates",
            state.candidate_backlog.len()
        ),
    );
    actions.extend(
        state
            .candidate_backlog
            .drain(..)
            .map(NegotiationAction::AddCandidate),
    );
}

fn on_hangup(state: &mut NegotiationState, actions: &mut Vec<NegotiationAction>) {
    state.signaling = SignalingState::Closed;
    state.making_offer = false;
    state.pending_op = None;
    state.renegotiation_pending = false;
    state.candidate_backlog.clear();
    actions.push(NegotiationAction::Close);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use NegotiationAction as A;
    use NegotiationEvent as E;

    fn offer(tag: &str) -> SessionDescription {
        SessionDescription::offer(format!("v=0\r\ns={tag}\r\n"))
    }

    fn answer(tag: &str) -> SessionDescription {
        SessionDescription::answer(format!("v=0\r\ns={tag}\r\n"))
    }

    fn cand(n: u16) -> IceCandidate {
        IceCandidate::new(format!("candidate:{n} 1 udp 1 10.0.0.{n} 9 typ host"), 0, "0")
    }

    /// Drops log actions so tests assert on effects only.
    fn effects(actions: Vec<NegotiationAction>) -> Vec<NegotiationAction> {
        actions
            .into_iter()
            .filter(|a| !matches!(a, A::Log { .. }))
            .collect()
    }

    fn step(state: NegotiationState, ev: NegotiationEvent) -> (NegotiationState, Vec<NegotiationAction>) {
        let (s, a) = reduce(state, ev);
        (s, effects(a))
    }

    /// Offer-creator after its offer was created: have-local-offer, epoch 1 used.
    fn offerer_with_local_offer() -> NegotiationState {
        let s = NegotiationState::new(Role::OfferCreator);
        let (s, a) = step(s, E::NegotiationNeeded);
        assert_eq!(a, vec![A::CreateOffer { epoch: 1 }]);
        let (s, _) = step(
            s,
            E::OfferCreated {
                epoch: 1,
                description: offer("a1"),
            },
        );
        s
    }

    #[test]
    fn negotiation_from_idle_creates_applies_and_sends_offer() {
        let s = NegotiationState::new(Role::OfferCreator);
        assert!(s.signaling().is_stable());

        let (s, a) = step(s, E::NegotiationNeeded);
        assert!(s.making_offer());
        assert_eq!(a, vec![A::CreateOffer { epoch: 1 }]);

        let (s, a) = step(
            s,
            E::OfferCreated {
                epoch: 1,
                description: offer("a1"),
            },
        );
        assert!(!s.making_offer());
        assert_eq!(s.signaling(), SignalingState::HaveLocalOffer);
        assert_eq!(
            a,
            vec![
                A::ApplyLocal(offer("a1")),
                A::Send(SignalingMsg::Offer(offer("a1")))
            ]
        );
    }

    #[test]
    fn need_while_unstable_is_deferred_then_resumed_after_answer() {
        let s = offerer_with_local_offer();
        let (s, a) = step(s, E::NegotiationNeeded);
        assert!(a.is_empty());
        assert!(s.renegotiation_pending());

        let (s, a) = step(s, E::RemoteAnswer(answer("b1")));
        assert_eq!(s.signaling(), SignalingState::Stable);
        assert_eq!(a, vec![A::ApplyRemote(answer("b1")), A::CreateOffer { epoch: 2 }]);
        assert!(!s.renegotiation_pending());
        assert!(s.making_offer());
    }

    #[test]
    fn stale_offer_completion_is_dropped() {
        let s = NegotiationState::new(Role::OfferCreator);
        let (s, _) = step(s, E::NegotiationNeeded);
        let (s, a) = step(
            s,
            E::OfferCreated {
                epoch: 42,
                description: offer("old"),
            },
        );
        assert_eq!(
            a,
            vec![A::Report(NegotiationError::StaleDescription {
                what: "offer completion"
            })]
        );
        assert!(s.making_offer());
        assert_eq!(s.signaling(), SignalingState::Idle);
    }

    #[test]
    fn impolite_side_ignores_colliding_offer() {
        let s = offerer_with_local_offer();
        let (s, a) = step(s, E::RemoteOffer(offer("b1")));
        assert_eq!(a, vec![A::Report(NegotiationError::CollisionDrop)]);
        assert!(s.ignore_offer());
        assert_eq!(s.signaling(), SignalingState::HaveLocalOffer);
        assert!(!s.has_remote_description());
    }

    #[test]
    fn polite_side_rolls_back_answers_and_renegotiates_later() {
        // Answerer that had already negotiated once, then started its own offer.
        let s = NegotiationState::new(Role::Answerer);
        let (s, _) = step(s, E::RemoteOffer(offer("a1")));
        let (s, _) = step(
            s,
            E::AnswerCreated {
                epoch: 1,
                description: answer("b1"),
            },
        );
        assert_eq!(s.signaling(), SignalingState::Stable);

        let (s, a) = step(s, E::NegotiationNeeded);
        assert_eq!(a, vec![A::CreateOffer { epoch: 2 }]);
        let (s, _) = step(
            s,
            E::OfferCreated {
                epoch: 2,
                description: offer("b2"),
            },
        );
        assert_eq!(s.signaling(), SignalingState::HaveLocalOffer);

        // Glare: the impolite side's offer arrives.
        let (s, a) = step(s, E::RemoteOffer(offer("a2")));
        assert_eq!(
            a,
            vec![
                A::Rollback,
                A::ApplyRemote(offer("a2")),
                A::CreateAnswer { epoch: 3 }
            ]
        );
        assert!(!s.ignore_offer());
        assert!(s.renegotiation_pending());
        assert_eq!(s.signaling(), SignalingState::HaveRemoteOffer);
        // Rolled back to the first negotiated pair.
        assert_eq!(s.current_local(), Some(&answer("b1")));

        let (s, a) = step(
            s,
            E::AnswerCreated {
                epoch: 3,
                description: answer("b3"),
            },
        );
        assert_eq!(
            a,
            vec![
                A::ApplyLocal(answer("b3")),
                A::Send(SignalingMsg::Answer(answer("b3"))),
                A::CreateOffer { epoch: 4 },
            ]
        );
        assert_eq!(s.current_remote(), Some(&offer("a2")));
    }

    #[test]
    fn polite_collision_while_creating_offer_makes_completion_stale() {
        let s = NegotiationState::new(Role::Answerer);
        let (s, _) = step(s, E::NegotiationNeeded);
        assert!(s.making_offer());

        let (s, a) = step(s, E::RemoteOffer(offer("a1")));
        assert_eq!(a, vec![A::ApplyRemote(offer("a1")), A::CreateAnswer { epoch: 2 }]);
        assert!(s.renegotiation_pending());

        let (_, a) = step(
            s,
            E::OfferCreated {
                epoch: 1,
                description: offer("b-old"),
            },
        );
        assert_eq!(
            a,
            vec![A::Report(NegotiationError::StaleDescription {
                what: "offer completion"
            })]
        );
    }

    #[test]
    fn answer_without_outstanding_offer_changes_nothing() {
        let s = offerer_with_local_offer();
        let (s, _) = step(s, E::RemoteAnswer(answer("b1")));
        let before = (s.signaling(), s.current_local().cloned(), s.current_remote().cloned());

        let (s, a) = step(s, E::RemoteAnswer(answer("b1")));
        assert_eq!(
            a,
            vec![A::Report(NegotiationError::StaleDescription { what: "answer" })]
        );
        let after = (s.signaling(), s.current_local().cloned(), s.current_remote().cloned());
        assert_eq!(before, after);
    }

    #[test]
    fn redelivered_offer_is_not_answered_twice() {
        let s = NegotiationState::new(Role::Answerer);
        let (s, _) = step(s, E::RemoteOffer(offer("a1")));
        let (s, _) = step(
            s,
            E::AnswerCreated {
                epoch: 1,
                description: answer("b1"),
            },
        );
        assert_eq!(s.signaling(), SignalingState::Stable);

        let (s, a) = step(s, E::RemoteOffer(offer("a1")));
        assert_eq!(
            a,
            vec![A::Report(NegotiationError::StaleDescription { what: "offer" })]
        );
        assert!(s.is_settled());
        assert_eq!(s.current_local(), Some(&answer("b1")));
        assert_eq!(s.current_remote(), Some(&offer("a1")));

        // A genuinely new offer is still answered.
        let (_, a) = step(s, E::RemoteOffer(offer("a2")));
        assert!(a.contains(&A::CreateAnswer { epoch: 2 }));
    }

    #[test]
    fn early_candidates_are_buffered_and_flushed_with_remote_offer() {
        let s = NegotiationState::new(Role::Answerer);
        let (s, a) = step(s, E::RemoteCandidate(cand(1)));
        assert!(a.is_empty());
        let (s, _) = step(s, E::RemoteCandidate(cand(2)));
        assert_eq!(s.backlog_len(), 2);

        let (s, a) = step(s, E::RemoteOffer(offer("a1")));
        assert_eq!(
            a,
            vec![
                A::ApplyRemote(offer("a1")),
                A::AddCandidate(cand(1)),
                A::AddCandidate(cand(2)),
                A::CreateAnswer { epoch: 1 },
            ]
        );
        assert_eq!(s.backlog_len(), 0);

        let (_, a) = step(s, E::RemoteCandidate(cand(3)));
        assert_eq!(a, vec![A::AddCandidate(cand(3))]);
    }

    #[test]
    fn candidate_backlog_is_bounded() {
        let mut s = NegotiationState::new(Role::Answerer);
        for n in 0..(MAX_CANDIDATE_BACKLOG as u16 + 5) {
            s = reduce(s, E::RemoteCandidate(cand(n))).0;
        }
        assert_eq!(s.backlog_len(), MAX_CANDIDATE_BACKLOG);
    }

    #[test]
    fn failed_answer_rolls_back_and_is_surfaced() {
        let s = NegotiationState::new(Role::Answerer);
        let (s, _) = step(s, E::RemoteOffer(offer("a1")));
        let (s, a) = step(
            s,
            E::DescriptionFailed {
                epoch: 1,
                reason: "codec mismatch".into(),
            },
        );
        assert_eq!(
            a,
            vec![
                A::Rollback,
                A::Report(NegotiationError::AnswerFailed("codec mismatch".into()))
            ]
        );
        assert_eq!(s.signaling(), SignalingState::Idle);
        assert!(!s.has_remote_description());
    }

    #[test]
    fn failed_offer_creation_is_surfaced_without_retry() {
        let s = NegotiationState::new(Role::OfferCreator);
        let (s, _) = step(s, E::NegotiationNeeded);
        let (s, a) = step(
            s,
            E::DescriptionFailed {
                epoch: 1,
                reason: "closed".into(),
            },
        );
        assert_eq!(a, vec![A::Report(NegotiationError::OfferFailed("closed".into()))]);
        assert!(s.is_settled());
    }

    #[test]
    fn rejected_remote_answer_restores_previous_stable_state() {
        let s = offerer_with_local_offer();
        let (s, _) = step(s, E::RemoteAnswer(answer("b1")));
        let (s, _) = step(s, E::ApplyFailed {
            reason: "bad sdp".into(),
        });
        assert_eq!(s.signaling(), SignalingState::Idle);
        assert!(s.current_remote().is_none());
        assert!(s.current_local().is_none());
    }

    #[test]
    fn hangup_closes_once_and_ignores_everything_after() {
        let s = offerer_with_local_offer();
        let (s, a) = step(s, E::Hangup);
        assert_eq!(a, vec![A::Close]);
        assert!(s.is_closed());

        let (s, a) = step(s, E::Hangup);
        assert!(a.is_empty());
        let (s, a) = step(s, E::RemoteOffer(offer("late")));
        assert!(a.is_empty());
        let (_, a) = step(s, E::LocalCandidate(cand(1)));
        assert!(a.is_empty());
    }

    #[test]
    fn local_candidates_are_relayed() {
        let s = NegotiationState::new(Role::OfferCreator);
        let (_, a) = step(s, E::LocalCandidate(cand(4)));
        assert_eq!(a, vec![A::Send(SignalingMsg::IceCandidate(cand(4)))]);
    }
}
