//! Shared fakes for integration tests: an in-memory chain behind the capability traits, a
//! scripted wallet, and a programmable HTTP backend.

#![allow(dead_code)]

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::watch;

use dapp_sync::blockchain::{ChainError, ChainId, ChainResult, ConfirmationStatus, SEPOLIA};
use dapp_sync::contracts::{
    ContractSet, FungibleAssetActions, FungibleAssetView, NonFungibleAssetActions,
    NonFungibleAssetView, StakerInfo, StakingActions, StakingView,
};
use dapp_sync::sync::{SyncSettings, Synchronizer, NFT_WEIGHT};
use dapp_sync::wallet::{WalletEvent, WalletEventBus, WalletProvider, WalletSubscription};

pub const SIGNER: Address = Address::repeat_byte(0xa1);
pub const OTHER: Address = Address::repeat_byte(0xb2);
pub const STAKING: Address = Address::repeat_byte(0x5c);

/// `n` whole tokens in 18-decimal base units.
pub fn tokens(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

/// Mutable world state shared by every fake.
pub struct ChainState {
    pub wallet_chain: ChainId,
    pub authorized: bool,
    pub reject_requests: bool,
    pub allow_switch: bool,
    /// Account the wallet signs for.
    pub signer: Address,

    pub token_owner: Address,
    pub balances: HashMap<Address, U256>,
    pub allowances: HashMap<(Address, Address), U256>,
    pub max_supply: U256,

    /// Index is the token id.
    pub nft_owners: Vec<Address>,
    pub operators: HashSet<(Address, Address)>,

    pub stakes: HashMap<Address, StakerInfo>,
    pub staked_ids: HashMap<Address, Vec<U256>>,
    pub pending_rewards: HashMap<Address, U256>,
    pub claimed: HashMap<Address, U256>,
    pub daily_reward: U256,
    pub total_accrued: U256,

    /// Reads that fail, by name (`"token.balance_of"`).
    pub failing: HashSet<&'static str>,
    pub reads: HashMap<&'static str, usize>,
    pub read_delay: Option<Duration>,
    /// Write calls in submission order.
    pub submissions: Vec<&'static str>,
    pub revert_next: Option<String>,
    pub block_number: u64,
    next_tx: u64,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            wallet_chain: SEPOLIA,
            authorized: true,
            reject_requests: false,
            allow_switch: false,
            signer: SIGNER,
            token_owner: SIGNER,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            max_supply: tokens(1_000_000),
            nft_owners: Vec::new(),
            operators: HashSet::new(),
            stakes: HashMap::new(),
            staked_ids: HashMap::new(),
            pending_rewards: HashMap::new(),
            claimed: HashMap::new(),
            daily_reward: tokens(1_000),
            total_accrued: U256::ZERO,
            failing: HashSet::new(),
            reads: HashMap::new(),
            read_delay: None,
            submissions: Vec::new(),
            revert_next: None,
            block_number: 100,
            next_tx: 1,
        }
    }
}

impl ChainState {
    fn total_weight(&self) -> U256 {
        self.stakes
            .values()
            .fold(U256::ZERO, |acc, info| acc + info.weight)
    }

    fn submit(&mut self, call: &'static str) -> ChainResult<TxHash> {
        if let Some(reason) = self.revert_next.take() {
            return Err(ChainError::Reverted(reason));
        }
        self.submissions.push(call);
        let n = self.next_tx;
        self.next_tx += 1;
        Ok(TxHash::left_padding_from(&n.to_be_bytes()))
    }
}

pub struct FakeChain {
    state: Mutex<ChainState>,
    confirmations_open: watch::Sender<bool>,
}

impl FakeChain {
    pub fn new(state: ChainState) -> Arc<Self> {
        let (confirmations_open, _) = watch::channel(true);
        Arc::new(Self {
            state: Mutex::new(state),
            confirmations_open,
        })
    }

    pub fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap()
    }

    pub fn reads_of(&self, name: &'static str) -> usize {
        self.state().reads.get(name).copied().unwrap_or(0)
    }

    pub fn submissions(&self) -> Vec<&'static str> {
        self.state().submissions.clone()
    }

    /// Confirmations block until [`release_confirmations`](Self::release_confirmations).
    pub fn hold_confirmations(&self) {
        self.confirmations_open.send_replace(false);
    }

    pub fn release_confirmations(&self) {
        self.confirmations_open.send_replace(true);
    }

    async fn read<T>(&self, name: &'static str, f: impl FnOnce(&ChainState) -> T) -> ChainResult<T> {
        let delay = {
            let mut state = self.state();
            *state.reads.entry(name).or_default() += 1;
            state.read_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let state = self.state();
        if state.failing.contains(name) {
            return Err(ChainError::Rpc(format!("injected failure: {}", name)));
        }
        Ok(f(&state))
    }

    fn write(
        &self,
        name: &'static str,
        f: impl FnOnce(&mut ChainState) -> Result<(), String>,
    ) -> ChainResult<TxHash> {
        let mut state = self.state();
        if let Some(reason) = state.revert_next.take() {
            return Err(ChainError::Reverted(reason));
        }
        f(&mut state).map_err(ChainError::Reverted)?;
        state.submit(name)
    }
}

pub struct FakeToken(pub Arc<FakeChain>);

#[async_trait]
impl FungibleAssetView for FakeToken {
    async fn name(&self) -> ChainResult<String> {
        self.0.read("token.name", |_| "Stake Token".to_string()).await
    }
    async fn symbol(&self) -> ChainResult<String> {
        self.0.read("token.symbol", |_| "STK".to_string()).await
    }
    async fn decimals(&self) -> ChainResult<u8> {
        self.0.read("token.decimals", |_| 18).await
    }
    async fn balance_of(&self, account: Address) -> ChainResult<U256> {
        self.0
            .read("token.balance_of", |s| s.balances.get(&account).copied().unwrap_or_default())
            .await
    }
    async fn allowance(&self, owner: Address, spender: Address) -> ChainResult<U256> {
        self.0
            .read("token.allowance", |s| {
                s.allowances.get(&(owner, spender)).copied().unwrap_or_default()
            })
            .await
    }
    async fn owner(&self) -> ChainResult<Address> {
        self.0.read("token.owner", |s| s.token_owner).await
    }
    async fn total_supply(&self) -> ChainResult<U256> {
        self.0
            .read("token.total_supply", |s| s.balances.values().fold(U256::ZERO, |a, b| a + b))
            .await
    }
    async fn max_supply(&self) -> ChainResult<U256> {
        Err(ChainError::Reverted("no supply cap".to_string()))
    }
}

#[async_trait]
impl FungibleAssetActions for FakeToken {
    async fn approve(&self, spender: Address, amount: U256) -> ChainResult<TxHash> {
        self.0.write("token.approve", |s| {
            s.allowances.insert((s.signer, spender), amount);
            Ok(())
        })
    }
    async fn mint(&self) -> ChainResult<TxHash> {
        self.0.write("token.mint", |s| {
            if s.signer != s.token_owner {
                return Err("Ownable: caller is not the owner".to_string());
            }
            *s.balances.entry(s.signer).or_default() += tokens(100);
            Ok(())
        })
    }
}

/// Reward token; only the supply cap is read.
pub struct FakeEarnToken(pub Arc<FakeChain>);

#[async_trait]
impl FungibleAssetView for FakeEarnToken {
    async fn name(&self) -> ChainResult<String> {
        self.0.read("earn.name", |_| "Earn Token".to_string()).await
    }
    async fn symbol(&self) -> ChainResult<String> {
        self.0.read("earn.symbol", |_| "ERN".to_string()).await
    }
    async fn decimals(&self) -> ChainResult<u8> {
        self.0.read("earn.decimals", |_| 18).await
    }
    async fn balance_of(&self, _account: Address) -> ChainResult<U256> {
        self.0.read("earn.balance_of", |_| U256::ZERO).await
    }
    async fn allowance(&self, _owner: Address, _spender: Address) -> ChainResult<U256> {
        self.0.read("earn.allowance", |_| U256::ZERO).await
    }
    async fn owner(&self) -> ChainResult<Address> {
        self.0.read("earn.owner", |_| STAKING).await
    }
    async fn total_supply(&self) -> ChainResult<U256> {
        self.0.read("earn.total_supply", |s| s.total_accrued).await
    }
    async fn max_supply(&self) -> ChainResult<U256> {
        self.0.read("earn.max_supply", |s| s.max_supply).await
    }
}

pub struct FakeNft(pub Arc<FakeChain>);

#[async_trait]
impl NonFungibleAssetView for FakeNft {
    async fn name(&self) -> ChainResult<String> {
        self.0.read("nft.name", |_| "Stake NFT".to_string()).await
    }
    async fn symbol(&self) -> ChainResult<String> {
        self.0.read("nft.symbol", |_| "SNFT".to_string()).await
    }
    async fn balance_of(&self, owner: Address) -> ChainResult<U256> {
        self.0
            .read("nft.balance_of", |s| {
                U256::from(s.nft_owners.iter().filter(|o| **o == owner).count())
            })
            .await
    }
    async fn owner_of(&self, token_id: U256) -> ChainResult<Address> {
        let index = token_id.saturating_to::<usize>();
        let owner = self
            .0
            .read("nft.owner_of", |s| s.nft_owners.get(index).copied())
            .await?;
        owner.ok_or_else(|| ChainError::Reverted("ERC721: invalid token ID".to_string()))
    }
    async fn total_supply(&self) -> ChainResult<U256> {
        self.0
            .read("nft.total_supply", |s| U256::from(s.nft_owners.len()))
            .await
    }
    async fn token_uri(&self, token_id: U256) -> ChainResult<String> {
        self.0
            .read("nft.token_uri", |_| format!("ipfs://collection/{}", token_id))
            .await
    }
    async fn is_approved_for_all(&self, owner: Address, operator: Address) -> ChainResult<bool> {
        self.0
            .read("nft.is_approved_for_all", |s| s.operators.contains(&(owner, operator)))
            .await
    }
}

#[async_trait]
impl NonFungibleAssetActions for FakeNft {
    async fn mint(&self, quantity: u32) -> ChainResult<TxHash> {
        self.0.write("nft.mint", |s| {
            for _ in 0..quantity {
                let signer = s.signer;
                s.nft_owners.push(signer);
            }
            Ok(())
        })
    }
    async fn approve(&self, _to: Address, _token_id: U256) -> ChainResult<TxHash> {
        self.0.write("nft.approve", |_| Ok(()))
    }
    async fn set_approval_for_all(&self, operator: Address, approved: bool) -> ChainResult<TxHash> {
        self.0.write("nft.set_approval_for_all", |s| {
            let key = (s.signer, operator);
            if approved {
                s.operators.insert(key);
            } else {
                s.operators.remove(&key);
            }
            Ok(())
        })
    }
}

pub struct FakeStaking(pub Arc<FakeChain>);

#[async_trait]
impl StakingView for FakeStaking {
    fn address(&self) -> Address {
        STAKING
    }
    async fn user_info(&self, user: Address) -> ChainResult<StakerInfo> {
        self.0
            .read("staking.user_info", |s| s.stakes.get(&user).copied().unwrap_or_default())
            .await
    }
    async fn pending_rewards(&self, user: Address) -> ChainResult<U256> {
        self.0
            .read("staking.pending_rewards", |s| {
                s.pending_rewards.get(&user).copied().unwrap_or_default()
            })
            .await
    }
    async fn total_earned(&self, user: Address) -> ChainResult<U256> {
        self.0
            .read("staking.total_earned", |s| {
                s.pending_rewards.get(&user).copied().unwrap_or_default()
                    + s.claimed.get(&user).copied().unwrap_or_default()
            })
            .await
    }
    async fn total_claimed(&self, user: Address) -> ChainResult<U256> {
        self.0
            .read("staking.total_claimed", |s| s.claimed.get(&user).copied().unwrap_or_default())
            .await
    }
    async fn staked_nft_ids(&self, user: Address) -> ChainResult<Vec<U256>> {
        self.0
            .read("staking.staked_nft_ids", |s| {
                s.staked_ids.get(&user).cloned().unwrap_or_default()
            })
            .await
    }
    async fn total_weight(&self) -> ChainResult<U256> {
        self.0.read("staking.total_weight", |s| s.total_weight()).await
    }
    async fn daily_reward(&self) -> ChainResult<U256> {
        self.0.read("staking.daily_reward", |s| s.daily_reward).await
    }
    async fn total_rewards_accrued(&self) -> ChainResult<U256> {
        self.0.read("staking.total_rewards_accrued", |s| s.total_accrued).await
    }
    async fn total_rewards_claimed(&self) -> ChainResult<U256> {
        self.0
            .read("staking.total_rewards_claimed", |s| {
                s.claimed.values().fold(U256::ZERO, |a, b| a + b)
            })
            .await
    }
    async fn total_rewards_pending(&self) -> ChainResult<U256> {
        self.0
            .read("staking.total_rewards_pending", |s| {
                s.pending_rewards.values().fold(U256::ZERO, |a, b| a + b)
            })
            .await
    }
}

#[async_trait]
impl StakingActions for FakeStaking {
    async fn stake_tokens(&self, amount: U256) -> ChainResult<TxHash> {
        self.0.write("staking.stake_tokens", |s| {
            let signer = s.signer;
            let allowance = s.allowances.get(&(signer, STAKING)).copied().unwrap_or_default();
            let balance = s.balances.get(&signer).copied().unwrap_or_default();
            if allowance < amount {
                return Err("ERC20: insufficient allowance".to_string());
            }
            if balance < amount {
                return Err("ERC20: transfer amount exceeds balance".to_string());
            }
            s.balances.insert(signer, balance - amount);
            let info = s.stakes.entry(signer).or_default();
            info.staked_tokens += amount;
            info.weight += amount;
            Ok(())
        })
    }
    async fn unstake_tokens(&self, amount: U256) -> ChainResult<TxHash> {
        self.0.write("staking.unstake_tokens", |s| {
            let signer = s.signer;
            let info = s.stakes.entry(signer).or_default();
            if info.staked_tokens < amount {
                return Err("Insufficient stake".to_string());
            }
            info.staked_tokens -= amount;
            info.weight -= amount;
            *s.balances.entry(signer).or_default() += amount;
            Ok(())
        })
    }
    async fn stake_nft(&self, token_id: U256) -> ChainResult<TxHash> {
        self.0.write("staking.stake_nft", |s| {
            let signer = s.signer;
            let index = token_id.saturating_to::<usize>();
            if s.nft_owners.get(index) != Some(&signer) {
                return Err("Not owner".to_string());
            }
            if !s.operators.contains(&(signer, STAKING)) {
                return Err("ERC721: caller is not token owner or approved".to_string());
            }
            s.nft_owners[index] = STAKING;
            s.staked_ids.entry(signer).or_default().push(token_id);
            let info = s.stakes.entry(signer).or_default();
            info.staked_nfts += U256::from(1u64);
            info.weight += tokens(NFT_WEIGHT);
            Ok(())
        })
    }
    async fn unstake_nft(&self, token_id: U256) -> ChainResult<TxHash> {
        self.0.write("staking.unstake_nft", |s| {
            let signer = s.signer;
            let ids = s.staked_ids.entry(signer).or_default();
            let Some(position) = ids.iter().position(|id| *id == token_id) else {
                return Err("Not staked".to_string());
            };
            ids.remove(position);
            s.nft_owners[token_id.saturating_to::<usize>()] = signer;
            let info = s.stakes.entry(signer).or_default();
            info.staked_nfts -= U256::from(1u64);
            info.weight -= tokens(NFT_WEIGHT);
            Ok(())
        })
    }
    async fn claim(&self) -> ChainResult<TxHash> {
        self.0.write("staking.claim", |s| {
            let signer = s.signer;
            let pending = s.pending_rewards.remove(&signer).unwrap_or_default();
            if pending.is_zero() {
                return Err("Nothing to claim".to_string());
            }
            *s.claimed.entry(signer).or_default() += pending;
            Ok(())
        })
    }
}

/// Scripted wallet over the fake chain.
pub struct FakeWallet {
    chain: Arc<FakeChain>,
    events: WalletEventBus,
}

impl FakeWallet {
    pub fn new(chain: Arc<FakeChain>) -> Arc<Self> {
        Arc::new(Self {
            chain,
            events: WalletEventBus::new(),
        })
    }

    pub fn emit(&self, event: WalletEvent) {
        self.events.emit(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.subscriber_count()
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn accounts(&self) -> ChainResult<Vec<Address>> {
        let state = self.chain.state();
        Ok(if state.authorized { vec![state.signer] } else { Vec::new() })
    }

    async fn request_accounts(&self) -> ChainResult<Vec<Address>> {
        let mut state = self.chain.state();
        if state.reject_requests {
            return Err(ChainError::UserRejected("User rejected the request".to_string()));
        }
        state.authorized = true;
        Ok(vec![state.signer])
    }

    async fn chain_id(&self) -> ChainResult<ChainId> {
        Ok(self.chain.state().wallet_chain)
    }

    async fn switch_chain(&self, chain_id: ChainId) -> ChainResult<()> {
        let mut state = self.chain.state();
        if !state.allow_switch {
            return Err(ChainError::UnsupportedChain(chain_id));
        }
        state.wallet_chain = chain_id;
        Ok(())
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        ceiling: Duration,
    ) -> ChainResult<ConfirmationStatus> {
        let mut open = self.chain.confirmations_open.subscribe();
        let confirmed = tokio::time::timeout(ceiling, open.wait_for(|open| *open)).await;
        match confirmed {
            Ok(_) => {
                let mut state = self.chain.state();
                state.block_number += 1;
                Ok(ConfirmationStatus::Confirmed {
                    block_number: state.block_number,
                })
            }
            Err(_) => Err(ChainError::ConfirmationTimeout(tx_hash)),
        }
    }

    fn subscribe(&self) -> WalletSubscription {
        self.events.subscribe()
    }
}

pub fn fake_contracts(chain: &Arc<FakeChain>) -> ContractSet {
    ContractSet {
        stake_token: Arc::new(FakeToken(chain.clone())),
        nft: Arc::new(FakeNft(chain.clone())),
        staking: Arc::new(FakeStaking(chain.clone())),
        earn_token: Arc::new(FakeEarnToken(chain.clone())),
    }
}

pub fn settings(poll_interval: Duration) -> SyncSettings {
    SyncSettings {
        expected_chain: SEPOLIA,
        poll_interval,
        confirmation_ceiling: Duration::from_secs(5),
    }
}

/// A synchronizer wired to a fake chain and wallet.
pub struct Harness {
    pub chain: Arc<FakeChain>,
    pub wallet: Arc<FakeWallet>,
    pub sync: Arc<Synchronizer>,
}

impl Harness {
    pub fn new(state: ChainState) -> Self {
        Self::with_settings(state, settings(Duration::from_secs(3600)))
    }

    pub fn with_settings(state: ChainState, settings: SyncSettings) -> Self {
        let chain = FakeChain::new(state);
        let wallet = FakeWallet::new(chain.clone());
        let sync = Synchronizer::new(
            Some(wallet.clone() as Arc<dyn WalletProvider>),
            fake_contracts(&chain),
            settings,
        );
        Self {
            chain,
            wallet,
            sync: Arc::new(sync),
        }
    }
}

/// Poll `condition` every 10ms for up to two seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// A request as seen by the programmable backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// Start a programmable HTTP backend on an ephemeral port.
pub async fn start_programmable_backend<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = handler(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<RecordedRequest> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buffer.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let body = String::from_utf8_lossy(&buffer[header_end..]).to_string();
    Some(RecordedRequest { method, path, body })
}

/// JSON-RPC backend: `handler(method, params)` returns the result or an `(code, message)`
/// error. Non-RPC requests go to `rest`.
pub async fn start_json_rpc_backend<H, R>(handler: H, rest: R) -> SocketAddr
where
    H: Fn(&str, &Value) -> Result<Value, (i64, String)> + Send + Sync + 'static,
    R: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    let rest = Arc::new(rest);
    start_programmable_backend(move |request| {
        let handler = handler.clone();
        let rest = rest.clone();
        async move {
            if request.method != "POST" {
                return rest(&request);
            }
            let Ok(call) = serde_json::from_str::<Value>(&request.body) else {
                return (500, "not json".to_string());
            };
            let id = call["id"].clone();
            let method = call["method"].as_str().unwrap_or_default().to_string();
            let response = match handler(&method, &call["params"]) {
                Ok(result) => serde_json::json!({ "jsonrpc": "2.0", "id": id, "result": result }),
                Err((code, message)) => serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": { "code": code, "message": message }
                }),
            };
            (200, response.to_string())
        }
    })
    .await
}
