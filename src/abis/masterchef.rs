use alloy::sol;

sol! {
    struct PoolInfo {
        address lpToken;
        uint256 accJoePerShare;
        uint256 lastRewardTimestamp;
        uint256 allocPoint;
        address rewarder;
    }

    #[sol(rpc)]
    interface IMasterChef {
        function joePerSec() external view returns (uint256);
        function totalAllocPoint() external view returns (uint256);
        function poolLength() external view returns (uint256);
        function poolInfo(uint256 pid) external view returns (PoolInfo memory);
    }
}
