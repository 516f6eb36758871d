//! The wallet-session synchronizer.
//!
//! # Responsibilities
//! - Track the wallet session (address, chain) and follow wallet events
//! - Keep an [`AssetSnapshot`] of the connected account fresh (on demand and by polling)
//! - Run guarded write actions: network check, authorization, submit, confirm, refresh

use alloy::primitives::{Address, TxHash, U256};
use arc_swap::ArcSwap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time;

use super::error::{SyncError, WriteOutcome};
use super::pending::{ActionTag, PendingSlot};
use super::session::{SessionState, WalletSession};
use super::snapshot::{
    parse_amount, AssetSnapshot, MiningProgress, NftPosition, StakingPosition, TokenPosition,
};
use crate::blockchain::types::{ChainId, ChainResult, ConfirmationStatus};
use crate::config::DappConfig;
use crate::contracts::{
    ContractSet, FungibleAssetActions, FungibleAssetView, NonFungibleAssetActions,
    NonFungibleAssetView, StakerInfo, StakingActions, StakingView,
};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::wallet::{WalletEvent, WalletProvider};

/// Largest NFT batch a single mint may request.
pub const MAX_NFT_MINT: u32 = 10;

/// Runtime knobs, usually taken from [`DappConfig`].
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Network every write must happen on.
    pub expected_chain: ChainId,
    pub poll_interval: Duration,
    /// How long a write waits for its confirmation before reporting it as still pending.
    pub confirmation_ceiling: Duration,
}

impl SyncSettings {
    pub fn from_config(config: &DappConfig) -> Self {
        Self {
            expected_chain: ChainId(config.network.chain_id),
            poll_interval: Duration::from_millis(config.sync.poll_interval_ms),
            confirmation_ceiling: Duration::from_secs(config.network.confirmation_timeout_secs),
        }
    }
}

/// What a write needs granted before it can be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// Stake-token allowance of at least `amount` for `spender`.
    Allowance { spender: Address, amount: U256 },
    /// Collection-wide operator approval for `operator`.
    Operator { operator: Address },
}

/// Keeps a local reflection of one wallet session and its on-chain positions.
///
/// Background work (polling, wallet events) holds only weak references, so dropping the
/// synchronizer stops it. Call [`teardown`](Self::teardown) to stop it explicitly.
pub struct Synchronizer {
    inner: Arc<Inner>,
}

struct Inner {
    wallet: Option<Arc<dyn WalletProvider>>,
    contracts: ContractSet,
    settings: SyncSettings,
    session: Mutex<WalletSession>,
    /// Bumped whenever the session changes; refresh results from an older epoch are dropped.
    epoch: AtomicU64,
    connecting: AtomicBool,
    snapshot: ArcSwap<AssetSnapshot>,
    revision: watch::Sender<u64>,
    pending: Arc<PendingSlot>,
    message: Mutex<Option<String>>,
    poller: Mutex<Option<Shutdown>>,
    events_task: Mutex<Option<JoinHandle<()>>>,
}

impl Synchronizer {
    pub fn new(
        wallet: Option<Arc<dyn WalletProvider>>,
        contracts: ContractSet,
        settings: SyncSettings,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                wallet,
                contracts,
                settings,
                session: Mutex::new(WalletSession::default()),
                epoch: AtomicU64::new(0),
                connecting: AtomicBool::new(false),
                snapshot: ArcSwap::from_pointee(AssetSnapshot::empty()),
                revision,
                pending: PendingSlot::new(),
                message: Mutex::new(None),
                poller: Mutex::new(None),
                events_task: Mutex::new(None),
            }),
        }
    }

    /// Pick up an already-authorized account without prompting and start following wallet
    /// events.
    pub async fn initialize(&self) {
        let Some(wallet) = self.inner.wallet.clone() else {
            self.inner.set_message(Some(SyncError::WalletAbsent.to_string()));
            tracing::info!("No wallet available; staying disconnected");
            return;
        };

        self.subscribe_wallet_events(wallet.as_ref());

        match wallet.accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(&address) => {
                    let chain_id = wallet.chain_id().await.ok();
                    tracing::info!(%address, "Resuming authorized wallet session");
                    self.inner.begin_session(address, chain_id).await;
                }
                None => tracing::debug!("Wallet exposes no accounts yet"),
            },
            Err(e) => tracing::warn!(error = %e, "Silent account lookup failed"),
        }
    }

    /// Ask the wallet for account access and start mirroring the granted account.
    pub async fn connect(&self) -> Result<Address, SyncError> {
        let result = self.connect_inner().await;
        self.inner.settle("connect", result)
    }

    async fn connect_inner(&self) -> Result<Address, SyncError> {
        let wallet = self.inner.wallet.clone().ok_or(SyncError::WalletAbsent)?;

        self.inner.connecting.store(true, Ordering::SeqCst);
        let requested = wallet.request_accounts().await;
        self.inner.connecting.store(false, Ordering::SeqCst);

        let address = *requested?.first().ok_or(SyncError::NotConnected)?;
        let chain_id = wallet.chain_id().await.ok();
        tracing::info!(%address, ?chain_id, "Wallet connected");

        self.inner.set_message(None);
        if !self.inner.begin_session(address, chain_id).await {
            tracing::info!(%address, "Session ended while connecting");
            return Err(SyncError::NotConnected);
        }
        Ok(address)
    }

    /// Forget the session locally. The wallet keeps its authorization.
    pub fn disconnect(&self) {
        self.inner.end_session();
        self.inner.set_message(None);
    }

    /// Re-read every position of the connected account.
    pub async fn refresh_snapshot(&self) {
        self.inner.refresh_snapshot().await;
    }

    /// Run one guarded write.
    ///
    /// When `authorization` is missing, only the approval is submitted and confirmed and
    /// [`WriteOutcome::ApprovalConfirmed`] is returned; the caller runs the action again.
    pub async fn perform_write<F, Fut>(
        &self,
        tag: ActionTag,
        authorization: Option<Authorization>,
        submit: F,
    ) -> Result<WriteOutcome, SyncError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = ChainResult<TxHash>> + Send,
    {
        let result = self.inner.write(tag, authorization, submit).await;
        match &result {
            Ok(WriteOutcome::Completed { .. }) => metrics::record_write(tag.as_str(), "completed"),
            Ok(WriteOutcome::ApprovalConfirmed { .. }) => {
                metrics::record_write(tag.as_str(), "approved")
            }
            Err(SyncError::ActionPending(_)) => metrics::record_write(tag.as_str(), "rejected"),
            Err(_) => metrics::record_write(tag.as_str(), "failed"),
        }
        self.inner.settle(tag.as_str(), result)
    }

    /// Owner-only mint of 100 stake tokens.
    pub async fn mint_tokens(&self) -> Result<WriteOutcome, SyncError> {
        let token = Arc::clone(&self.inner.contracts.stake_token);
        self.perform_write(ActionTag::MintTokens, None, move || async move {
            token.mint().await
        })
        .await
    }

    pub async fn mint_nft(&self, quantity: u32) -> Result<WriteOutcome, SyncError> {
        if !(1..=MAX_NFT_MINT).contains(&quantity) {
            return self.reject(SyncError::InvalidInput(format!(
                "quantity must be between 1 and {}",
                MAX_NFT_MINT
            )));
        }
        let nft = Arc::clone(&self.inner.contracts.nft);
        self.perform_write(ActionTag::MintNft, None, move || async move {
            nft.mint(quantity).await
        })
        .await
    }

    /// Stake `amount` stake tokens, given as a decimal string.
    pub async fn stake_tokens(&self, amount: &str) -> Result<WriteOutcome, SyncError> {
        let amount = match parse_amount(amount, self.snapshot().token.decimals) {
            Ok(amount) => amount,
            Err(e) => return self.reject(e),
        };
        let staking = Arc::clone(&self.inner.contracts.staking);
        let authorization = Authorization::Allowance {
            spender: staking.address(),
            amount,
        };
        self.perform_write(ActionTag::StakeTokens, Some(authorization), move || async move {
            staking.stake_tokens(amount).await
        })
        .await
    }

    pub async fn unstake_tokens(&self, amount: &str) -> Result<WriteOutcome, SyncError> {
        let amount = match parse_amount(amount, self.snapshot().token.decimals) {
            Ok(amount) => amount,
            Err(e) => return self.reject(e),
        };
        let staking = Arc::clone(&self.inner.contracts.staking);
        self.perform_write(ActionTag::UnstakeTokens, None, move || async move {
            staking.unstake_tokens(amount).await
        })
        .await
    }

    /// Stake an NFT the connected account holds.
    pub async fn stake_nft(&self, token_id: U256) -> Result<WriteOutcome, SyncError> {
        if !self.snapshot().nft.owned_ids.contains(&token_id) {
            return self.reject(SyncError::InvalidInput(format!(
                "NFT #{} is not held by the connected account",
                token_id
            )));
        }
        let staking = Arc::clone(&self.inner.contracts.staking);
        let authorization = Authorization::Operator {
            operator: staking.address(),
        };
        self.perform_write(ActionTag::StakeNft, Some(authorization), move || async move {
            staking.stake_nft(token_id).await
        })
        .await
    }

    pub async fn unstake_nft(&self, token_id: U256) -> Result<WriteOutcome, SyncError> {
        if !self.snapshot().staking.staked_nft_ids.contains(&token_id) {
            return self.reject(SyncError::InvalidInput(format!(
                "NFT #{} is not staked by the connected account",
                token_id
            )));
        }
        let staking = Arc::clone(&self.inner.contracts.staking);
        self.perform_write(ActionTag::UnstakeNft, None, move || async move {
            staking.unstake_nft(token_id).await
        })
        .await
    }

    pub async fn claim_rewards(&self) -> Result<WriteOutcome, SyncError> {
        let staking = Arc::clone(&self.inner.contracts.staking);
        self.perform_write(ActionTag::ClaimRewards, None, move || async move {
            staking.claim().await
        })
        .await
    }

    /// Stop polling and stop following wallet events. Safe to call repeatedly.
    pub fn teardown(&self) {
        self.inner.stop_polling();
        if let Some(task) = lock(&self.inner.events_task).take() {
            task.abort();
            tracing::debug!("Wallet event subscription released");
        }
    }

    pub fn snapshot(&self) -> Arc<AssetSnapshot> {
        self.inner.snapshot.load_full()
    }

    pub fn session(&self) -> WalletSession {
        self.inner.session()
    }

    pub fn state(&self) -> SessionState {
        SessionState::derive(
            &self.inner.session(),
            self.inner.connecting.load(Ordering::SeqCst),
            self.inner.pending.current(),
        )
    }

    /// Latest user-facing status or error text.
    pub fn message(&self) -> Option<String> {
        lock(&self.inner.message).clone()
    }

    /// Receives a new revision number every time the snapshot is replaced.
    pub fn subscribe_revisions(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Whether a poll loop is running.
    pub fn is_polling(&self) -> bool {
        lock(&self.inner.poller)
            .as_ref()
            .is_some_and(|shutdown| shutdown.receiver_count() > 0)
    }

    fn reject<T>(&self, err: SyncError) -> Result<T, SyncError> {
        self.inner.settle("validate", Err(err))
    }

    fn subscribe_wallet_events(&self, wallet: &dyn WalletProvider) {
        let mut subscription = wallet.subscribe();
        let weak = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                let Some(inner) = weak.upgrade() else { break };
                inner.handle_wallet_event(event).await;
            }
            tracing::debug!("Wallet event loop finished");
        });
        if let Some(previous) = lock(&self.inner.events_task).replace(task) {
            previous.abort();
        }
    }
}

impl Inner {
    fn session(&self) -> WalletSession {
        *lock(&self.session)
    }

    fn set_message(&self, message: Option<String>) {
        *lock(&self.message) = message;
    }

    /// Record a failure in the message field and hand the result back.
    fn settle<T>(&self, operation: &str, result: Result<T, SyncError>) -> Result<T, SyncError> {
        if let Err(e) = &result {
            tracing::warn!(operation, error = %e, "Operation failed");
            self.set_message(Some(e.to_string()));
        }
        result
    }

    fn store_snapshot(&self, snapshot: AssetSnapshot) {
        self.snapshot.store(Arc::new(snapshot));
        self.revision.send_modify(|revision| *revision += 1);
    }

    /// Install `address` as the session, refresh it and start polling. Returns `false` when
    /// the session was ended or replaced before the first refresh finished; polling is then
    /// left to whoever replaced it.
    async fn begin_session(self: &Arc<Self>, address: Address, chain_id: Option<ChainId>) -> bool {
        self.stop_polling();
        {
            let mut session = lock(&self.session);
            let switched_account = session.address != Some(address);
            *session = WalletSession::connected(address, chain_id);
            self.epoch.fetch_add(1, Ordering::SeqCst);
            if switched_account {
                self.store_snapshot(AssetSnapshot::empty());
            }
        }
        self.refresh_snapshot().await;

        let session = lock(&self.session);
        if session.address != Some(address) {
            return false;
        }
        self.start_polling();
        true
    }

    fn end_session(&self) {
        self.pending.clear();
        {
            let mut session = lock(&self.session);
            *session = WalletSession::default();
            self.epoch.fetch_add(1, Ordering::SeqCst);
            self.store_snapshot(AssetSnapshot::empty());
        }
        // After the session is cleared, so a concurrent begin_session cannot restart it.
        self.stop_polling();
        tracing::info!("Wallet session ended");
    }

    fn start_polling(self: &Arc<Self>) {
        let shutdown = Shutdown::new();
        let stop = shutdown.subscribe();
        if let Some(previous) = lock(&self.poller).replace(shutdown) {
            previous.trigger();
        }
        tokio::spawn(poll_loop(
            Arc::downgrade(self),
            self.settings.poll_interval,
            stop,
        ));
    }

    fn stop_polling(&self) {
        if let Some(shutdown) = lock(&self.poller).take() {
            shutdown.trigger();
            tracing::debug!("Polling stopped");
        }
    }

    async fn handle_wallet_event(self: &Arc<Self>, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    tracing::info!("Wallet revoked access");
                    self.end_session();
                    self.set_message(Some(SyncError::NotConnected.to_string()));
                }
                Some(&address) if self.session().address == Some(address) => {}
                Some(&address) => {
                    tracing::info!(%address, "Wallet switched account");
                    let chain_id = match &self.wallet {
                        Some(wallet) => wallet.chain_id().await.ok(),
                        None => None,
                    }
                    .or(self.session().chain_id);
                    self.begin_session(address, chain_id).await;
                }
            },
            WalletEvent::ChainChanged(chain_id) => {
                tracing::info!(%chain_id, "Wallet switched network");
                let connected = {
                    let mut session = lock(&self.session);
                    session.chain_id = Some(chain_id);
                    self.epoch.fetch_add(1, Ordering::SeqCst);
                    session.is_connected()
                };
                if connected {
                    self.refresh_snapshot().await;
                }
            }
        }
    }

    async fn refresh_snapshot(&self) {
        let (session, epoch) = {
            let session = lock(&self.session);
            (*session, self.epoch.load(Ordering::SeqCst))
        };

        let Some(account) = session.address.filter(|_| self.wallet.is_some()) else {
            let _session = lock(&self.session);
            if self.epoch.load(Ordering::SeqCst) == epoch {
                self.store_snapshot(AssetSnapshot::empty());
            }
            return;
        };

        let prior = self.snapshot.load_full();
        let token = &self.contracts.stake_token;
        let nft = &self.contracts.nft;
        let staking = &self.contracts.staking;
        let earn = &self.contracts.earn_token;

        let (
            token_name,
            token_symbol,
            token_decimals,
            token_balance,
            token_owner,
            nft_name,
            nft_symbol,
            nft_balance,
            nft_owned,
            user_info,
            pending_rewards,
            total_earned,
            total_claimed,
            staked_nft_ids,
            total_weight,
            daily_reward,
            accrued,
            claimed,
            outstanding,
            max_supply,
        ) = tokio::join!(
            token.name(),
            token.symbol(),
            token.decimals(),
            token.balance_of(account),
            token.owner(),
            nft.name(),
            nft.symbol(),
            nft.balance_of(account),
            nft.owned_token_ids(account),
            staking.user_info(account),
            staking.pending_rewards(account),
            staking.total_earned(account),
            staking.total_claimed(account),
            staking.staked_nft_ids(account),
            staking.total_weight(),
            staking.daily_reward(),
            staking.total_rewards_accrued(),
            staking.total_rewards_claimed(),
            staking.total_rewards_pending(),
            earn.max_supply(),
        );

        let mut batch = ReadBatch::default();
        let prior_info = StakerInfo {
            staked_tokens: prior.staking.staked_tokens,
            staked_nfts: prior.staking.staked_nfts,
            weight: prior.staking.weight,
            ..StakerInfo::default()
        };
        let info = batch.keep("staking.user_info", user_info, &prior_info);

        let snapshot = AssetSnapshot {
            account: Some(account),
            token: TokenPosition {
                name: batch.keep("token.name", token_name, &prior.token.name),
                symbol: batch.keep("token.symbol", token_symbol, &prior.token.symbol),
                decimals: batch.keep("token.decimals", token_decimals, &prior.token.decimals),
                balance: batch.keep("token.balance", token_balance, &prior.token.balance),
                owner: batch
                    .keep("token.owner", token_owner.map(Some), &prior.token.owner),
            },
            nft: NftPosition {
                name: batch.keep("nft.name", nft_name, &prior.nft.name),
                symbol: batch.keep("nft.symbol", nft_symbol, &prior.nft.symbol),
                balance: batch.keep("nft.balance", nft_balance, &prior.nft.balance),
                owned_ids: batch.keep("nft.owned_ids", nft_owned, &prior.nft.owned_ids),
            },
            staking: StakingPosition {
                staked_tokens: info.staked_tokens,
                staked_nfts: info.staked_nfts,
                weight: info.weight,
                pending_rewards: batch.keep(
                    "staking.pending_rewards",
                    pending_rewards,
                    &prior.staking.pending_rewards,
                ),
                total_earned: batch.keep(
                    "staking.total_earned",
                    total_earned,
                    &prior.staking.total_earned,
                ),
                total_claimed: batch.keep(
                    "staking.total_claimed",
                    total_claimed,
                    &prior.staking.total_claimed,
                ),
                staked_nft_ids: batch.keep(
                    "staking.staked_nft_ids",
                    staked_nft_ids,
                    &prior.staking.staked_nft_ids,
                ),
                total_weight: batch.keep(
                    "staking.total_weight",
                    total_weight,
                    &prior.staking.total_weight,
                ),
                daily_reward: batch.keep(
                    "staking.daily_reward",
                    daily_reward,
                    &prior.staking.daily_reward,
                ),
            },
            mining: MiningProgress {
                total_accrued: batch.keep("mining.total_accrued", accrued, &prior.mining.total_accrued),
                total_claimed: batch.keep("mining.total_claimed", claimed, &prior.mining.total_claimed),
                total_pending: batch.keep(
                    "mining.total_pending",
                    outstanding,
                    &prior.mining.total_pending,
                ),
                max_supply: batch.keep("mining.max_supply", max_supply, &prior.mining.max_supply),
            },
            refreshed_at: Some(SystemTime::now()),
        };

        {
            let _session = lock(&self.session);
            if self.epoch.load(Ordering::SeqCst) != epoch {
                tracing::debug!(%account, "Session changed during refresh; result discarded");
                metrics::record_refresh("stale");
                return;
            }
            self.store_snapshot(snapshot);
        }

        if batch.failures == 0 {
            metrics::record_refresh("ok");
            tracing::debug!(%account, "Snapshot refreshed");
        } else {
            metrics::record_refresh("partial");
            tracing::info!(%account, failures = batch.failures, "Snapshot refreshed with stale fields");
        }
    }

    async fn write<F, Fut>(
        &self,
        tag: ActionTag,
        authorization: Option<Authorization>,
        submit: F,
    ) -> Result<WriteOutcome, SyncError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = ChainResult<TxHash>> + Send,
    {
        let _guard = self
            .pending
            .try_acquire(tag)
            .map_err(SyncError::ActionPending)?;
        let wallet = self.wallet.clone().ok_or(SyncError::WalletAbsent)?;
        let account = self.session().address.ok_or(SyncError::NotConnected)?;

        self.ensure_network(wallet.as_ref()).await?;

        if let Some(authorization) = authorization {
            if !self.is_authorized(account, authorization).await? {
                tracing::info!(action = %tag, ?authorization, "Authorization missing; requesting approval");
                let tx_hash = self.approve(authorization).await?;
                let block_number = self.confirm(wallet.as_ref(), tx_hash).await?;
                self.set_message(Some(format!(
                    "approval confirmed in block {}; run {} again to continue",
                    block_number, tag
                )));
                return Ok(WriteOutcome::ApprovalConfirmed {
                    tx_hash,
                    block_number,
                });
            }
        }

        let tx_hash = submit().await?;
        tracing::info!(action = %tag, %tx_hash, "Transaction submitted");
        let block_number = self.confirm(wallet.as_ref(), tx_hash).await?;

        self.refresh_snapshot().await;
        self.set_message(Some(format!("{} confirmed in block {}", tag, block_number)));
        Ok(WriteOutcome::Completed {
            tx_hash,
            block_number,
        })
    }

    async fn ensure_network(&self, wallet: &dyn WalletProvider) -> Result<(), SyncError> {
        let expected = self.settings.expected_chain;
        let actual = wallet.chain_id().await?;
        if actual == expected {
            return Ok(());
        }

        tracing::warn!(%expected, %actual, "Wallet is on the wrong network; requesting a switch");
        let switched = match wallet.switch_chain(expected).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Network switch refused");
                false
            }
        };
        Err(SyncError::WrongNetwork {
            expected,
            actual,
            switched,
        })
    }

    async fn is_authorized(
        &self,
        account: Address,
        authorization: Authorization,
    ) -> Result<bool, SyncError> {
        let granted = match authorization {
            Authorization::Allowance { spender, amount } => {
                self.contracts
                    .stake_token
                    .allowance(account, spender)
                    .await?
                    >= amount
            }
            Authorization::Operator { operator } => {
                self.contracts
                    .nft
                    .is_approved_for_all(account, operator)
                    .await?
            }
        };
        Ok(granted)
    }

    async fn approve(&self, authorization: Authorization) -> Result<TxHash, SyncError> {
        let tx_hash = match authorization {
            Authorization::Allowance { spender, .. } => {
                self.contracts.stake_token.approve(spender, U256::MAX).await?
            }
            Authorization::Operator { operator } => {
                self.contracts.nft.set_approval_for_all(operator, true).await?
            }
        };
        Ok(tx_hash)
    }

    async fn confirm(&self, wallet: &dyn WalletProvider, tx_hash: TxHash) -> Result<u64, SyncError> {
        match wallet
            .wait_for_confirmation(tx_hash, self.settings.confirmation_ceiling)
            .await?
        {
            ConfirmationStatus::Confirmed { block_number } => {
                tracing::info!(%tx_hash, block_number, "Transaction confirmed");
                Ok(block_number)
            }
            ConfirmationStatus::Failed(reason) => Err(SyncError::Reverted(reason)),
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.events_task).take() {
            task.abort();
        }
        if let Some(shutdown) = lock(&self.poller).take() {
            shutdown.trigger();
        }
    }
}

async fn poll_loop(inner: Weak<Inner>, period: Duration, mut stop: broadcast::Receiver<()>) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    // The first tick completes immediately; the session already refreshed on start.
    ticker.tick().await;

    tracing::debug!(
        interval_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
        "Polling started"
    );
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else { break };
                inner.refresh_snapshot().await;
            }
            _ = stop.recv() => break,
        }
    }
}

/// Collects per-field outcomes of one read batch.
#[derive(Default)]
struct ReadBatch {
    failures: usize,
}

impl ReadBatch {
    /// The fresh value, or `prior` when the read failed.
    fn keep<T: Clone>(&mut self, field: &'static str, result: ChainResult<T>, prior: &T) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                self.failures += 1;
                metrics::record_read_failure(field);
                tracing::warn!(field, error = %e, "Read failed; keeping previous value");
                prior.clone()
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
