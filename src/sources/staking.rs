use std::future::IntoFuture;
use std::time::Duration;

use alloy::{
    primitives::{Address, U256},
    providers::{DynProvider, ProviderBuilder, MULTICALL3_ADDRESS},
    sol_types::SolCall,
};
use async_trait::async_trait;
use futures::future::try_join_all;
use log::debug;
use url::Url;

use super::RewardSource;
use crate::{
    abis::{masterchef::IMasterChef, multicall::Call3, IMulticall3},
    error::{Result, YieldError},
    models::{RewardPoolInfo, RewardSnapshot},
    utils::u256_to_f64,
};

const SERVICE: &str = "staking contract";

/// Timeout for individual RPC calls (30 seconds)
const RPC_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads emission parameters from a MasterChef-style staking contract.
///
/// Scalar reads (`joePerSec`, `totalAllocPoint`, `poolLength`) go out
/// concurrently; `poolInfo` for every index is batched through multicall3.
/// Every call must succeed, a single failure fails the snapshot.
#[derive(Clone)]
pub struct MasterChefReader {
    provider: DynProvider,
    contract: Address,
}

impl MasterChefReader {
    /// Pool indexes per multicall request
    const MULTICALL_BATCH_SIZE: usize = 100;

    pub fn new(rpc_url: &str, contract: &str) -> Result<Self> {
        let url = Url::parse(rpc_url).map_err(|e| YieldError::upstream(SERVICE, e))?;
        let contract = contract
            .parse()
            .map_err(|e| YieldError::upstream(SERVICE, e))?;

        let client = ProviderBuilder::new().connect_http(url);
        let provider = DynProvider::new(client);

        Ok(Self { provider, contract })
    }

    async fn read<T, E, F>(fut: F) -> Result<T>
    where
        F: IntoFuture<Output = std::result::Result<T, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        tokio::time::timeout(RPC_CALL_TIMEOUT, fut)
            .await
            .map_err(|e| YieldError::upstream(SERVICE, e))?
            .map_err(|e| YieldError::upstream(SERVICE, e))
    }

    async fn fetch_pool_infos(&self, indexes: &[u64]) -> Result<Vec<RewardPoolInfo>> {
        let chef = IMasterChef::new(self.contract, &self.provider);
        let multicall = IMulticall3::new(MULTICALL3_ADDRESS, &self.provider);

        let calls: Vec<Call3> = indexes
            .iter()
            .map(|&pid| Call3 {
                target: self.contract,
                allowFailure: false,
                callData: chef.poolInfo(U256::from(pid)).calldata().to_vec().into(),
            })
            .collect();

        let results = Self::read(multicall.aggregate3(calls).call()).await?;

        if results.len() != indexes.len() {
            return Err(YieldError::malformed(
                SERVICE,
                format!("{} poolInfo results for {} calls", results.len(), indexes.len()),
            ));
        }

        results
            .iter()
            .zip(indexes)
            .map(|(res, pid)| {
                let info = IMasterChef::poolInfoCall::abi_decode_returns(&res.returnData)
                    .map_err(|e| YieldError::malformed(SERVICE, format!("poolInfo({pid}): {e}")))?;

                Ok(RewardPoolInfo {
                    lp_token: info.lpToken.to_string().to_lowercase(),
                    alloc_point: u256_to_f64(info.allocPoint, 0),
                })
            })
            .collect()
    }
}

#[async_trait]
impl RewardSource for MasterChefReader {
    async fn reward_snapshot(&self) -> Result<RewardSnapshot> {
        let chef = IMasterChef::new(self.contract, &self.provider);

        let per_sec_call = chef.joePerSec();
        let total_alloc_call = chef.totalAllocPoint();
        let length_call = chef.poolLength();

        let (per_sec, total_alloc, length) = futures::try_join!(
            Self::read(per_sec_call.call()),
            Self::read(total_alloc_call.call()),
            Self::read(length_call.call()),
        )?;

        let length: u64 = length
            .try_into()
            .map_err(|_| YieldError::malformed(SERVICE, format!("poolLength {length}")))?;
        let indexes: Vec<u64> = (0..length).collect();

        let batches = try_join_all(
            indexes
                .chunks(Self::MULTICALL_BATCH_SIZE)
                .map(|chunk| self.fetch_pool_infos(chunk)),
        )
        .await?;

        let pools: Vec<RewardPoolInfo> = batches.into_iter().flatten().collect();

        debug!("Read {} staking pools from {}", pools.len(), self.contract);

        Ok(RewardSnapshot {
            reward_per_second: u256_to_f64(per_sec, 0),
            total_alloc_point: u256_to_f64(total_alloc, 0),
            pools,
        })
    }
}
