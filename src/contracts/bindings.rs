//! Solidity interfaces of the deployed contracts.

use alloy::sol;

sol! {
    /// ERC-20 with owner-only fixed mint and an optional supply cap.
    #[sol(rpc)]
    interface StakeToken {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function MAX_SUPPLY() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function owner() external view returns (address);
        function approve(address spender, uint256 amount) external returns (bool);
        function mint100() external;
    }

    /// Enumerable-by-id ERC-721 with batch mint.
    #[sol(rpc)]
    interface StakeNft {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function balanceOf(address owner) external view returns (uint256);
        function ownerOf(uint256 tokenId) external view returns (address);
        function totalSupply() external view returns (uint256);
        function tokenURI(uint256 tokenId) external view returns (string);
        function isApprovedForAll(address owner, address operator) external view returns (bool);
        function setApprovalForAll(address operator, bool approved) external;
        function approve(address to, uint256 tokenId) external;
        function mint(uint256 quantity) external;
    }

    /// Launchpad staking: tokens and NFTs accrue weight, weight earns a daily reward share.
    #[sol(rpc)]
    interface LaunchpadStaking {
        struct UserInfo {
            uint256 stakedTokens;
            uint256 stakedNFTs;
            uint256 weight;
            uint256 rewards;
            uint256 rewardPerWeightPaid;
            uint256 claimed;
        }

        function getUserInfo(address user) external view returns (UserInfo memory);
        function pendingRewards(address user) external view returns (uint256);
        function totalEarned(address user) external view returns (uint256);
        function totalClaimed(address user) external view returns (uint256);
        function stakedNFTs(address user) external view returns (uint256[] memory);
        function totalWeight() external view returns (uint256);
        function DAILY_REWARD() external view returns (uint256);
        function totalRewardsAccrued() external view returns (uint256);
        function totalRewardsClaimed() external view returns (uint256);
        function totalRewardsPending() external view returns (uint256);

        function stakeTokens(uint256 amount) external;
        function unstakeTokens(uint256 amount) external;
        function stakeNFT(uint256 tokenId) external;
        function unstakeNFT(uint256 tokenId) external;
        function claim() external;
    }
}
